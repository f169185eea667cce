//! Lenient coercions for JSON coming from persisted documents and operator
//! request bodies. Numeric fields may arrive as numbers or numeric strings;
//! anything unusable yields `None` so callers can fall back to a default.

use serde_json::Value;

/// Integer view of a JSON value. Floats are truncated toward zero and
/// strings are parsed after trimming.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// Non-empty trimmed string, or `None`.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn field<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

pub fn non_negative_int(obj: &Value, key: &str) -> Option<u64> {
    field(obj, key).and_then(as_int).map(|n| n.max(0) as u64)
}

pub fn non_negative_float(obj: &Value, key: &str) -> Option<f64> {
    field(obj, key).and_then(as_float).map(|f| f.max(0.0))
}

/// Truncates to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_coerce() {
        assert_eq!(as_int(&json!(12)), Some(12));
        assert_eq!(as_int(&json!(12.9)), Some(12));
        assert_eq!(as_int(&json!(" 7 ")), Some(7));
        assert_eq!(as_int(&json!("abc")), None);
        assert_eq!(as_float(&json!("0.5")), Some(0.5));
        assert_eq!(as_float(&json!(true)), None);
    }

    #[test]
    fn negative_values_floor_at_zero() {
        let obj = json!({"maxSeconds": -5, "secondsPerCoin": "-1.5"});
        assert_eq!(non_negative_int(&obj, "maxSeconds"), Some(0));
        assert_eq!(non_negative_float(&obj, "secondsPerCoin"), Some(0.0));
        assert_eq!(non_negative_int(&obj, "missing"), None);
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("💎💎💎", 2), "💎💎");
        assert_eq!(clamp_unit(3.0), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }
}
