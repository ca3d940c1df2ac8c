//! Portion scale factors.
//!
//! Every stored scale goes through [`normalize_scale`] at write time, so a
//! scale read back from a [`ShoppingListState`](crate::shopping_list::ShoppingListState)
//! is always within [`MIN_SCALE`]..=[`MAX_SCALE`].

use serde_json::Value;

/// Smallest accepted portion multiplier
pub const MIN_SCALE: f64 = 0.1;
/// Largest accepted portion multiplier
pub const MAX_SCALE: f64 = 20.0;
/// Scale used when the input is missing or unusable
pub const DEFAULT_SCALE: f64 = 1.0;

/// Clamp a scale factor into the valid range.
///
/// Non-finite or non-positive input resolves to [`DEFAULT_SCALE`].
///
/// ```rust
/// use shopping_list::scale::normalize_scale;
///
/// assert_eq!(normalize_scale(50.0), 20.0);
/// assert_eq!(normalize_scale(0.01), 0.1);
/// assert_eq!(normalize_scale(-5.0), 1.0);
/// assert_eq!(normalize_scale(f64::NAN), 1.0);
/// ```
pub fn normalize_scale(input: f64) -> f64 {
    if !input.is_finite() || input <= 0.0 {
        return DEFAULT_SCALE;
    }
    input.clamp(MIN_SCALE, MAX_SCALE)
}

/// Normalize an optional scale, treating `None` as "not given"
pub fn normalize_scale_opt(input: Option<f64>) -> f64 {
    input.map(normalize_scale).unwrap_or(DEFAULT_SCALE)
}

/// Normalize a scale typed by the user into a text field
pub fn parse_scale(input: &str) -> f64 {
    normalize_scale(coerce_number_str(input))
}

/// Normalize a scale read from an untyped JSON document (stored data, share payloads)
pub fn normalize_scale_value(value: &Value) -> f64 {
    normalize_scale(coerce_number(value))
}

/// Coerce an arbitrary JSON value to a number.
///
/// Strings are parsed after trimming (empty means zero), booleans map to
/// 0/1, `null` is zero, and anything else is NaN.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => coerce_number_str(s),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn coerce_number_str(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
