//! Coercion of the raw `count` query parameter into a repeat count.

use std::fmt;

/// Lower bound applied to `count` unless configured otherwise
pub const DEFAULT_MIN_REPEAT: u32 = 1;
/// Upper bound applied to `count` unless configured otherwise
pub const DEFAULT_MAX_REPEAT: u32 = 5;

/// What a probe does when `count` is missing or not a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountFallback {
    /// Run this many reads instead
    Default(u32),
    /// Run no reads at all; the response carries `data: null`
    Skip,
}

impl Default for CountFallback {
    fn default() -> Self {
        CountFallback::Default(DEFAULT_MIN_REPEAT)
    }
}

impl fmt::Display for CountFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountFallback::Default(n) => write!(f, "default({})", n),
            CountFallback::Skip => write!(f, "skip"),
        }
    }
}

/// Bounds and fallback used to turn `count` into a number of reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatPolicy {
    pub min: u32,
    pub max: u32,
    pub fallback: CountFallback,
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_REPEAT,
            max: DEFAULT_MAX_REPEAT,
            fallback: CountFallback::default(),
        }
    }
}

impl RepeatPolicy {
    /// Number of sequential reads to perform for a raw `count` value
    pub fn resolve(&self, raw: Option<&str>) -> u32 {
        match to_number(raw, self.min, self.max) {
            Some(n) => n,
            None => match self.fallback {
                CountFallback::Default(n) => n.clamp(self.min, self.max),
                CountFallback::Skip => 0,
            },
        }
    }
}

/// Convert a query parameter to a number clamped to `[min, max]`.
///
/// Returns `None` when the parameter is missing or not numeric. Numeric
/// means the literal grammar browsers apply to query values: decimals,
/// exponents, `Infinity`, and unsigned `0x`/`0o`/`0b` integers. An empty
/// string counts as zero. Fractions round up after clamping, matching a
/// loop of the form `for i in 0.. while i < n`.
pub fn to_number(raw: Option<&str>, min: u32, max: u32) -> Option<u32> {
    let num = parse_numeric(raw?.trim())?;
    if num.is_nan() {
        return None;
    }

    let clamped = num.max(min as f64).min(max as f64);
    Some(clamped.ceil() as u32)
}

fn parse_numeric(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(0.0);
    }

    let radix = match raw.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&raw[2..], radix).ok().map(|n| n as f64);
    }

    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if unsigned == "Infinity" {
        return raw.parse::<f64>().ok();
    }
    // Rust also accepts `inf`, `infinity` and `nan` in any case
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    raw.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_to_number_clamps() {
        assert_eq!(to_number(Some("999"), 1, 5), Some(5));
        assert_eq!(to_number(Some("0"), 1, 5), Some(1));
        assert_eq!(to_number(Some("3"), 1, 5), Some(3));
        assert_eq!(to_number(Some("-7"), 1, 5), Some(1));
    }

    #[test]
    fn test_to_number_non_numeric() {
        assert_eq!(to_number(None, 1, 5), None);
        assert_eq!(to_number(Some("not-a-number"), 1, 5), None);
        assert_eq!(to_number(Some("NaN"), 1, 5), None);
    }

    #[test]
    fn test_to_number_edge_inputs() {
        // Empty parses as zero and is clamped up, not treated as missing
        assert_eq!(to_number(Some(""), 1, 5), Some(1));
        assert_eq!(to_number(Some(" 2 "), 1, 5), Some(2));
        assert_eq!(to_number(Some("2.5"), 1, 5), Some(3));
    }

    #[test]
    fn test_to_number_literal_grammar() {
        assert_eq!(to_number(Some("Infinity"), 1, 5), Some(5));
        assert_eq!(to_number(Some("-Infinity"), 1, 5), Some(1));
        assert_eq!(to_number(Some("inf"), 1, 5), None);
        assert_eq!(to_number(Some("infinity"), 1, 5), None);
        assert_eq!(to_number(Some("nan"), 1, 5), None);
        assert_eq!(to_number(Some("0x10"), 1, 5), Some(5));
        assert_eq!(to_number(Some("0x2"), 1, 5), Some(2));
        assert_eq!(to_number(Some("0b11"), 1, 5), Some(3));
        assert_eq!(to_number(Some("-0x2"), 1, 5), None);
        assert_eq!(to_number(Some("0xZZ"), 1, 5), None);
        assert_eq!(to_number(Some("1e1"), 1, 5), Some(5));
        assert_eq!(to_number(Some(".5"), 1, 5), Some(1));
    }

    #[test]
    fn test_default_policy_falls_back_to_one() {
        let policy = RepeatPolicy::default();
        assert_eq!(policy.resolve(None), 1);
        assert_eq!(policy.resolve(Some("not-a-number")), 1);
        assert_eq!(policy.resolve(Some("4")), 4);
    }

    // The two conventions disagree on invalid input: one runs a single read,
    // the other runs none. Both are supported; they must not be conflated.
    #[test]
    fn test_skip_policy_runs_no_reads_on_invalid_count() {
        let policy = RepeatPolicy {
            fallback: CountFallback::Skip,
            ..Default::default()
        };
        assert_eq!(policy.resolve(None), 0);
        assert_eq!(policy.resolve(Some("abc")), 0);
        assert_eq!(policy.resolve(Some("0")), 1);
        assert_eq!(policy.resolve(Some("9")), 5);
        assert_ne!(policy.resolve(None), RepeatPolicy::default().resolve(None));
    }

    #[test]
    fn test_default_fallback_is_clamped_to_bounds() {
        let policy = RepeatPolicy {
            min: 2,
            max: 4,
            fallback: CountFallback::Default(10),
        };
        assert_eq!(policy.resolve(None), 4);
    }

    #[test]
    fn test_count_fallback_display() {
        assert_eq!(CountFallback::Default(1).to_string(), "default(1)");
        assert_eq!(CountFallback::Skip.to_string(), "skip");
    }

    proptest! {
        #[test]
        fn prop_numeric_input_stays_in_bounds(n in any::<i64>(), min in 1u32..10, span in 0u32..10) {
            let max = min + span;
            let value = to_number(Some(&n.to_string()), min, max).unwrap();
            prop_assert!(value >= min && value <= max);
        }

        #[test]
        fn prop_resolve_never_exceeds_max(raw in ".*") {
            let policy = RepeatPolicy::default();
            prop_assert!(policy.resolve(Some(&raw)) <= policy.max);
        }
    }
}
