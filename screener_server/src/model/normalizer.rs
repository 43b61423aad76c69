//! Cleanup of exchange-formatted numeric text.
//!
//! The exchange feed sends numbers as text with thousands separators
//! (`"1,234.50"`) and uses a bare `"-"` for a value it does not have. The
//! normalizer turns that into text `str::parse::<f64>` accepts. What `"-"` becomes
//! is a [`DashPolicy`]: the feed historically treats it as zero, which is kept as
//! the default even though it cannot be told apart from a real zero.
use std::borrow::Cow;

/// Placeholder the exchange uses for "no value".
pub const DASH: &str = "-";

/// How the `"-"` placeholder is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DashPolicy {
    /// `"-"` becomes `"0"`.
    #[default]
    Zero,
    /// `"-"` becomes an absent value.
    Null,
}

/// Normalizes one raw value with the default policy: `"-"` → `"0"`, grouping
/// commas stripped, anything else passed through.
pub fn normalize(raw: &str) -> Cow<'_, str> {
    if raw == DASH {
        return Cow::Borrowed("0");
    }
    if raw.contains(',') {
        Cow::Owned(raw.replace(',', ""))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Normalizes one raw value under `policy`; `None` means the value is absent.
pub fn normalize_with(raw: &str, policy: DashPolicy) -> Option<Cow<'_, str>> {
    match (raw, policy) {
        (DASH, DashPolicy::Null) => None,
        _ => Some(normalize(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_becomes_zero() {
        assert_eq!(normalize("-"), "0");
    }

    #[test]
    fn grouping_commas_are_stripped() {
        assert_eq!(normalize("1,234"), "1234");
        assert_eq!(normalize("12,34,567.25"), "1234567.25");
    }

    #[test]
    fn other_text_passes_through() {
        assert_eq!(normalize("42.5"), "42.5");
        assert_eq!(normalize("-3.5"), "-3.5");
        assert_eq!(normalize("N/A"), "N/A");
        assert!(matches!(normalize("42.5"), Cow::Borrowed(_)));
    }

    #[test]
    fn null_policy_drops_the_placeholder() {
        assert_eq!(normalize_with("-", DashPolicy::Null), None);
        assert_eq!(normalize_with("-", DashPolicy::Zero).as_deref(), Some("0"));
        assert_eq!(normalize_with("1,000", DashPolicy::Null).as_deref(), Some("1000"));
    }
}
