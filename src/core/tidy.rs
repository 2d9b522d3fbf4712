//! Input tidying: extract credential candidates from pasted text.
//!
//! Each applicable provider pattern is scanned over the whole text and the
//! matches are concatenated pattern by pattern, then deduplicated. If
//! nothing matches, the text is split into trimmed, non-empty lines instead.

use std::collections::HashSet;
use std::iter;

use super::patterns::{self, CLASSIFY_PRIORITY};
use super::provider::{Provider, ProviderFilter};

/// A match of one pattern, as a byte span of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Strictly inside `other` (same span does not count).
    const fn within(self, other: Self) -> bool {
        other.start <= self.start
            && self.end <= other.end
            && other.end - other.start > self.end - self.start
    }
}

/// Patterns scanned in auto mode: the classification priority, then the
/// generic `sk-` shape.
fn auto_order() -> impl Iterator<Item = Provider> {
    CLASSIFY_PRIORITY
        .iter()
        .copied()
        .chain(iter::once(Provider::Custom))
}

fn spans_for(text: &str, provider: Provider) -> Vec<Span> {
    patterns::substring(provider)
        .map(|re| {
            re.find_iter(text)
                .map(|m| Span {
                    start: m.start(),
                    end: m.end(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn dedupe<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Extract credential candidates from `text`.
///
/// A concrete filter collects every substring match of that provider's
/// pattern. `Auto` concatenates the matches of every pattern in priority
/// order; a match lying strictly inside a longer match of another pattern
/// (a 32-character prefix of a 48-character key, say) is dropped.
///
/// Idempotent: tidying the newline-joined output yields the same list.
#[must_use]
pub fn tidy(text: &str, filter: ProviderFilter) -> Vec<String> {
    let spans: Vec<Span> = match filter {
        ProviderFilter::Single(provider) => spans_for(text, provider),
        ProviderFilter::Auto => {
            let grouped: Vec<Span> = auto_order().flat_map(|p| spans_for(text, p)).collect();
            grouped
                .iter()
                .copied()
                .filter(|span| !grouped.iter().any(|other| span.within(*other)))
                .collect()
        }
    };

    if spans.is_empty() {
        tracing::debug!("No credential patterns matched, splitting by line");
        return dedupe(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string),
        );
    }

    let found = dedupe(spans.into_iter().map(|s| text[s.start..s.end].to_string()));
    tracing::debug!(count = found.len(), filter = %filter, "Extracted credentials");
    found
}

/// Extract deduplicated `scheme://host[:port]` endpoints from `text`.
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    patterns::url_pattern().map_or_else(Vec::new, |re| {
        dedupe(re.find_iter(text).map(|m| m.as_str().to_string()))
    })
}
