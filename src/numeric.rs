//! Numeric and text helpers shared by the codec, the segment operations
//! and the rule model.
//!
//! None of these fail: unparsable input becomes `0` (or the documented
//! fallback) and out-of-range values are clamped.

use serde::{Deserialize, Deserializer};

/// Round half toward positive infinity (`2.5 -> 3`, `-2.5 -> -2`).
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to an integer sample count or position. Non-finite input is 0.
#[inline]
pub fn round_to_i64(value: f64) -> i64 {
    if value.is_finite() {
        round_half_up(value) as i64
    } else {
        0
    }
}

/// Truncate to a fixed resolution, e.g. `truncate(1.23456, 1000) == 1.235`.
#[inline]
pub fn truncate(value: f64, resolution: f64) -> f64 {
    round_half_up(value * resolution) / resolution
}

/// Number of distinct values representable in `bytes` bytes (`256^bytes`).
#[inline]
pub fn max_value_for_bytes(bytes: usize) -> i64 {
    1_i64 << (8 * bytes.min(7))
}

/// Parse the longest leading decimal number in `text`.
///
/// Accepts an optional sign, digits, a fractional part and an exponent,
/// ignoring anything after. Returns `None` when no digits lead the text.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if !text[digits_start..end].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// Coerce a JSON value to a number: numbers pass through, numeric strings
/// are parsed, everything else (and NaN) becomes 0.
pub fn number_or_zero(value: &serde_json::Value) -> f64 {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => parse_float_prefix(s).unwrap_or(0.0),
        serde_json::Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

/// Serde adapter: lenient float field.
pub fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(number_or_zero(&value))
}

/// Largest integer a JSON number holds exactly.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Serde adapter: lenient integer field, fractional values rounded and
/// clamped to `±MAX_SAFE_INTEGER`.
pub fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(round_to_i64(number_or_zero(&value)).clamp(-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER))
}

/// Serde adapter: lenient text field. Numbers are stringified, anything
/// else that is not a string becomes empty.
pub fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Serde adapter: lenient color channel, clamped to `0..=255`.
pub fn lenient_u8<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(round_half_up(number_or_zero(&value)).clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(2.5, 3.0 ; "half rounds up")]
    #[test_case(-2.5, -2.0 ; "negative half rounds toward positive")]
    #[test_case(2.4999, 2.0 ; "below half rounds down")]
    #[test_case(-0.6, -1.0 ; "negative rounds away")]
    fn test_round_half_up(input: f64, expected: f64) {
        assert_eq!(round_half_up(input), expected);
    }

    #[test]
    fn test_round_to_i64_non_finite() {
        assert_eq!(round_to_i64(f64::NAN), 0);
        assert_eq!(round_to_i64(f64::INFINITY), 0);
        assert_eq!(round_to_i64(22050.5), 22051);
    }

    #[test]
    fn test_lenient_i64_clamps_huge_values() {
        #[derive(serde::Deserialize)]
        struct Field {
            #[serde(deserialize_with = "lenient_i64")]
            value: i64,
        }
        let parse = |json: &str| serde_json::from_str::<Field>(json).unwrap().value;
        assert_eq!(parse(r#"{ "value": -1e300 }"#), -MAX_SAFE_INTEGER);
        assert_eq!(parse(r#"{ "value": 1e300 }"#), MAX_SAFE_INTEGER);
        assert_eq!(parse(r#"{ "value": "12.5" }"#), 13);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(1.23456, 1000.0), 1.235);
        assert_eq!(truncate(0.5, 1000.0), 0.5);
    }

    #[test]
    fn test_max_value_for_bytes() {
        assert_eq!(max_value_for_bytes(1), 256);
        assert_eq!(max_value_for_bytes(2), 65536);
        assert_eq!(max_value_for_bytes(3), 16_777_216);
        assert_eq!(max_value_for_bytes(4), 4_294_967_296);
    }

    #[test_case("2", Some(2.0) ; "integer")]
    #[test_case(" 0.25 ", Some(0.25) ; "padded fraction")]
    #[test_case("4abc", Some(4.0) ; "trailing garbage")]
    #[test_case("-1.5e2x", Some(-150.0) ; "signed exponent")]
    #[test_case("3e", Some(3.0) ; "dangling exponent")]
    #[test_case(".5", Some(0.5) ; "leading dot")]
    #[test_case("", None ; "empty")]
    #[test_case("abc", None ; "letters")]
    #[test_case("-", None ; "bare sign")]
    fn test_parse_float_prefix(input: &str, expected: Option<f64>) {
        assert_eq!(parse_float_prefix(input), expected);
    }

    #[test]
    fn test_number_or_zero() {
        assert_eq!(number_or_zero(&serde_json::json!(12.5)), 12.5);
        assert_eq!(number_or_zero(&serde_json::json!("7")), 7.0);
        assert_eq!(number_or_zero(&serde_json::json!("nope")), 0.0);
        assert_eq!(number_or_zero(&serde_json::json!(null)), 0.0);
        assert_eq!(number_or_zero(&serde_json::json!([1, 2])), 0.0);
    }
}
