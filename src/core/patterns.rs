//! Credential shape patterns per provider.
//!
//! Each provider has a substring form (used when scanning free text) and an
//! anchored form (used when classifying a single candidate). The anchored
//! form is the substring form wrapped in `^(?:...)$`.

use std::sync::LazyLock;

use regex::Regex;

use super::provider::Provider;

/// Order in which anchored patterns are tried during auto classification.
///
/// A 48-character `sk-` key matches both SiliconFlow and OpenAI; SiliconFlow
/// is listed first so it wins.
pub const CLASSIFY_PRIORITY: &[Provider] = &[
    Provider::Siliconflow,
    Provider::Claude,
    Provider::Gemini,
    Provider::Deepseek,
    Provider::OpenAI,
    Provider::Groq,
    Provider::Xai,
];

/// Generic bearer-token shape used as the classification fallback.
pub const GENERIC_BEARER: &str = r"sk-[a-zA-Z0-9]+";

/// Substring pattern source for a provider.
#[must_use]
pub const fn pattern_source(provider: Provider) -> &'static str {
    match provider {
        Provider::Siliconflow => r"sk-[a-zA-Z0-9]{48}",
        Provider::Claude => r"sk-ant-api03-\S{95}",
        Provider::Gemini => r"AIzaSy\S{33}",
        Provider::Deepseek => r"sk-[a-zA-Z0-9]{32}",
        Provider::OpenAI => r"sk-proj-\S{156}|sk-proj-\S{124}|sk-proj-\S{48}|sk-[a-zA-Z0-9]{48}",
        Provider::Groq => r"gsk_[a-zA-Z0-9]{52}",
        Provider::Xai => r"xai-[a-zA-Z0-9]{80}",
        Provider::Custom => GENERIC_BEARER,
    }
}

fn compile(source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::error!(pattern = source, error = %err, "Invalid credential pattern");
            None
        }
    }
}

struct PatternSet {
    anchored: Vec<(Provider, Regex)>,
    substring: Vec<(Provider, Regex)>,
}

static PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    let mut anchored = Vec::with_capacity(Provider::ALL.len());
    let mut substring = Vec::with_capacity(Provider::ALL.len());
    for &provider in Provider::ALL {
        let source = pattern_source(provider);
        if let Some(re) = compile(&format!("^(?:{source})$")) {
            anchored.push((provider, re));
        }
        if let Some(re) = compile(source) {
            substring.push((provider, re));
        }
    }
    PatternSet {
        anchored,
        substring,
    }
});

static URL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::\d{1,5})?"));

/// Anchored pattern for a provider, matching the whole candidate.
#[must_use]
pub fn anchored(provider: Provider) -> Option<&'static Regex> {
    PATTERNS
        .anchored
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, re)| re)
}

/// Substring pattern for a provider, used to scan free text.
#[must_use]
pub fn substring(provider: Provider) -> Option<&'static Regex> {
    PATTERNS
        .substring
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, re)| re)
}

/// All substring patterns.
pub fn all_substring() -> impl Iterator<Item = (Provider, &'static Regex)> {
    PATTERNS.substring.iter().map(|(p, re)| (*p, re))
}

/// Endpoint URL pattern (`scheme://host[:port]`).
#[must_use]
pub fn url_pattern() -> Option<&'static Regex> {
    URL_PATTERN.as_ref()
}
