//! Numeric coercion: arbitrary JSON value → one finite `f64`, or nothing.
//!
//! Parsed filings carry figures in three shapes: native numbers, formatted
//! strings (`"1,234,567"`, `" 12.5 "`), and objects keyed by fiscal period
//! (`{"2022": "100", "2023": "150"}`). [`FieldValue`] is the tagged union of
//! exactly those shapes; anything else is unresolvable.
//!
//! String parsing is permissive: after stripping commas and
//! whitespace the longest leading decimal number is taken, so `"12.5億"`
//! yields `12.5`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// The value shapes the coercer understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// A native JSON number.
    Scalar(f64),
    /// A possibly formatted numeric string.
    Text(&'a str),
    /// A mapping keyed by a sub-dimension, usually the fiscal period.
    Nested(&'a Map<String, Value>),
}

impl<'a> FieldValue<'a> {
    /// Classify a JSON value. `None` for null, booleans, arrays and empty
    /// objects.
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(FieldValue::Scalar),
            Value::String(s) => Some(FieldValue::Text(s)),
            Value::Object(map) if !map.is_empty() => Some(FieldValue::Nested(map)),
            _ => None,
        }
    }

    /// Reduce this shape to a finite number.
    pub fn to_number(self) -> Option<f64> {
        match self {
            FieldValue::Scalar(n) => n.is_finite().then_some(n),
            FieldValue::Text(s) => parse_numeric_text(s),
            FieldValue::Nested(map) => latest_period(map),
        }
    }
}

/// Coerce a value to a finite number.
///
/// For nested mappings the entry with the lexicographically greatest key
/// among the coercible entries is used: period keys such as `"2023"` or
/// `"2024-03-31"` sort with recency.
pub fn coerce(value: &Value) -> Option<f64> {
    FieldValue::classify(value).and_then(FieldValue::to_number)
}

static RE_NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap()
});

fn parse_numeric_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let prefix = RE_NUMERIC_PREFIX.find(&cleaned)?;
    prefix
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn latest_period(map: &Map<String, Value>) -> Option<f64> {
    map.iter()
        .filter_map(|(key, value)| coerce(value).map(|n| (key, n)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, n)| n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_numbers() {
        assert_eq!(coerce(&json!(42)), Some(42.0));
        assert_eq!(coerce(&json!(-0.25)), Some(-0.25));
    }

    #[test]
    fn thousands_separators_and_whitespace() {
        assert_eq!(coerce(&json!("1,234.5")), Some(1234.5));
        assert_eq!(coerce(&json!("  1,234,567 ")), Some(1_234_567.0));
        assert_eq!(coerce(&json!("1 234")), Some(1234.0));
        assert_eq!(coerce(&json!("\u{3000}980\u{3000}")), Some(980.0));
        assert_eq!(coerce(&json!("-3.2e3")), Some(-3200.0));
    }

    #[test]
    fn numeric_prefix_is_permissive() {
        assert_eq!(coerce(&json!("12.5億")), Some(12.5));
        assert_eq!(coerce(&json!("45%")), Some(45.0));
        assert_eq!(coerce(&json!(".5")), Some(0.5));
        assert_eq!(coerce(&json!("7e")), Some(7.0));
    }

    #[test]
    fn numeric_prefix_stops_at_non_ascii_digits() {
        assert_eq!(coerce(&json!("12５")), Some(12.0));
        assert_eq!(coerce(&json!("7٣")), Some(7.0));
        assert_eq!(coerce(&json!("５００")), None);
    }

    #[test]
    fn non_numeric_text_is_unresolvable() {
        assert_eq!(coerce(&json!("注記参照")), None);
        assert_eq!(coerce(&json!("")), None);
        assert_eq!(coerce(&json!("-")), None);
        assert_eq!(coerce(&json!("Infinity")), None);
    }

    #[test]
    fn overflowing_text_is_unresolvable() {
        let huge = format!("1{}", "0".repeat(400));
        assert_eq!(coerce(&Value::String(huge)), None);
    }

    #[test]
    fn nested_picks_greatest_coercible_key() {
        let v = json!({"2022": "100", "2023": "150", "note": "x"});
        assert_eq!(coerce(&v), Some(150.0));
    }

    #[test]
    fn nested_ignores_key_order_in_document() {
        let v = json!({"2024-03-31": 9, "2023-03-31": 7});
        assert_eq!(coerce(&v), Some(9.0));
    }

    #[test]
    fn nested_recurses_into_inner_mappings() {
        let v = json!({"FY2022": {"Q4": "10"}, "FY2023": {"Q1": "1", "Q4": "40"}});
        assert_eq!(coerce(&v), Some(40.0));
    }

    #[test]
    fn unsupported_shapes() {
        assert_eq!(coerce(&Value::Null), None);
        assert_eq!(coerce(&json!(true)), None);
        assert_eq!(coerce(&json!([1, 2])), None);
        assert_eq!(coerce(&json!({})), None);
        assert_eq!(coerce(&json!({"a": null, "b": "n/a"})), None);
    }

    #[test]
    fn classify_shapes() {
        assert_eq!(FieldValue::classify(&json!(1)), Some(FieldValue::Scalar(1.0)));
        assert_eq!(FieldValue::classify(&json!("x")), Some(FieldValue::Text("x")));
        assert!(matches!(
            FieldValue::classify(&json!({"k": 1})),
            Some(FieldValue::Nested(_))
        ));
        assert_eq!(FieldValue::classify(&json!(false)), None);
    }
}
