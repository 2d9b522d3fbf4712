//! Credential classification.
//!
//! Maps a raw candidate string to the provider whose credential shape it
//! matches. Pure and total: every input yields `Some(provider)` or `None`.

use super::patterns::{self, CLASSIFY_PRIORITY};
use super::provider::{Provider, ProviderFilter};

/// Classifier with a configurable fallback for generic `sk-` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    fallback: Provider,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            fallback: Provider::OpenAI,
        }
    }
}

impl Classifier {
    #[must_use]
    pub const fn new(fallback: Provider) -> Self {
        Self { fallback }
    }

    #[must_use]
    pub const fn fallback(&self) -> Provider {
        self.fallback
    }

    /// Resolve the provider for `raw`.
    ///
    /// A concrete hint is returned unchanged. Under `Auto`, anchored patterns
    /// are tried in [`CLASSIFY_PRIORITY`] order, then the generic bearer
    /// shape maps to the fallback provider.
    #[must_use]
    pub fn classify(&self, raw: &str, hint: ProviderFilter) -> Option<Provider> {
        if let ProviderFilter::Single(provider) = hint {
            return Some(provider);
        }

        let specific = CLASSIFY_PRIORITY.iter().copied().find(|&provider| {
            patterns::anchored(provider).is_some_and(|re| re.is_match(raw))
        });
        if specific.is_some() {
            return specific;
        }

        patterns::anchored(Provider::Custom)
            .is_some_and(|re| re.is_match(raw))
            .then_some(self.fallback)
    }
}

/// Classify with the default fallback (OpenAI).
#[must_use]
pub fn classify(raw: &str, hint: ProviderFilter) -> Option<Provider> {
    Classifier::default().classify(raw, hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alnum(n: usize) -> String {
        "aB3".chars().cycle().take(n).collect()
    }

    #[test]
    fn hint_wins_even_for_garbage() {
        assert_eq!(
            classify("not a key", ProviderFilter::Single(Provider::Claude)),
            Some(Provider::Claude)
        );
    }

    #[test]
    fn forty_eight_char_sk_prefers_siliconflow() {
        let key = format!("sk-{}", alnum(48));
        assert_eq!(classify(&key, ProviderFilter::Auto), Some(Provider::Siliconflow));
    }

    #[test]
    fn thirty_two_char_sk_is_deepseek() {
        let key = format!("sk-{}", alnum(32));
        assert_eq!(classify(&key, ProviderFilter::Auto), Some(Provider::Deepseek));
    }

    #[test]
    fn recognizes_distinct_shapes() {
        let cases = [
            (format!("sk-ant-api03-{}", alnum(95)), Provider::Claude),
            (format!("AIzaSy{}", alnum(33)), Provider::Gemini),
            (format!("gsk_{}", alnum(52)), Provider::Groq),
            (format!("xai-{}", alnum(80)), Provider::Xai),
            (format!("sk-proj-{}", alnum(124)), Provider::OpenAI),
        ];
        for (key, expected) in cases {
            assert_eq!(classify(&key, ProviderFilter::Auto), Some(expected), "{key}");
        }
    }

    #[test]
    fn generic_sk_falls_back() {
        let key = format!("sk-{}", alnum(20));
        assert_eq!(classify(&key, ProviderFilter::Auto), Some(Provider::OpenAI));
        let custom = Classifier::new(Provider::Custom);
        assert_eq!(custom.classify(&key, ProviderFilter::Auto), Some(Provider::Custom));
    }

    #[test]
    fn unrecognized_is_none() {
        for raw in ["", "hello", "sk-", "sk-has space", "AIzaSyshort"] {
            assert_eq!(classify(raw, ProviderFilter::Auto), None, "{raw:?}");
        }
    }
}
