//! Number and credential formatting utilities.

/// Mask a credential for display: first 8 and last 4 characters.
///
/// Values of 12 characters or fewer are fully masked.
#[must_use]
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len().max(3));
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Format an amount with up to two decimals and no trailing zeros.
#[must_use]
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Format an optional balance with its currency, `-` when unknown.
#[must_use]
pub fn format_balance(value: Option<f64>, currency: Option<&str>) -> String {
    match (value, currency) {
        (Some(v), Some(c)) => format!("{} {c}", format_amount(v)),
        (Some(v), None) => format_amount(v),
        (None, _) => "-".to_string(),
    }
}
