use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

///
/// Coerces an untrusted JSON value into a selection weight.
///
/// Numbers are taken as they are, numeric text is parsed, booleans count as 1 or 0.
/// Anything that does not come out as a finite number is worth 0.
///
pub fn coerce_weight(value: &Value) -> f64 {
    match value {
        Value::Number(number) => finite_or_zero(number.as_f64().unwrap_or(0.0)),
        Value::String(text) => parse_weight_text(text),
        Value::Bool(true) => 1.0,
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    }
}

pub fn finite_or_zero(weight: f64) -> f64 {
    if weight.is_finite() {
        weight
    } else {
        0.0
    }
}

fn parse_weight_text(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    let radix = match text.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    let parsed = match radix {
        Some(radix) => parse_radix_digits(&text[2..], radix),
        // Rust accepts "inf" and "NaN" here, the finite check below drops them
        None => text.parse::<f64>().ok(),
    };
    parsed.map(finite_or_zero).unwrap_or(0.0)
}

/// Digits only, no sign. Accumulates in f64 so long literals stay large instead of overflowing.
fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
}

/// Rejects weights that cannot be stored: negative, infinite or NaN.
pub fn validate_weight(weight: f64) -> Result<f64> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(weight)
    } else {
        Err(Error::InvalidWeight(weight))
    }
}

///
/// A weight exactly as it arrived (from storage, an import, or the user).
///
/// The raw value is kept so that saving and exporting hand back what was read.
/// Use [`Weight::value`] for the number the picker sees.
///
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(Value);

impl Weight {
    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn value(&self) -> f64 {
        coerce_weight(&self.0)
    }
}

impl From<f64> for Weight {
    fn from(weight: f64) -> Self {
        Weight(serde_json::Number::from_f64(weight).map_or(Value::Null, Value::Number))
    }
}

impl From<Value> for Weight {
    fn from(value: Value) -> Self {
        Weight(value)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Number(_) => write!(f, "{}", self.value()),
            raw => write!(f, "{} ({})", self.value(), raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(coerce_weight(&json!(3)), 3.0);
        assert_eq!(coerce_weight(&json!(0.2)), 0.2);
        assert_eq!(coerce_weight(&json!(0)), 0.0);
        assert_eq!(coerce_weight(&json!(-4)), -4.0);
    }

    #[test]
    fn test_numeric_text() {
        let test_cases = vec![
            ("10", 10.0),
            (" 2.5 ", 2.5),
            ("1e2", 100.0),
            ("0x10", 16.0),
            ("0b101", 5.0),
            ("0o17", 15.0),
            ("-3", -3.0),
        ];
        for (text, expected) in test_cases {
            assert_eq!(
                coerce_weight(&json!(text)),
                expected,
                "{:?} should coerce to {}",
                text,
                expected
            );
        }
    }

    #[test]
    fn test_garbage_is_zero() {
        for value in vec![
            json!("abc"),
            json!(""),
            json!("   "),
            json!("10abc"),
            json!("NaN"),
            json!("inf"),
            json!("Infinity"),
            json!("0xZZ"),
            json!("0x+10"),
            json!("0x-10"),
            json!("0x"),
            json!("0b102"),
            json!(null),
            json!([5]),
            json!({"weight": 5}),
            json!(false),
        ] {
            assert_eq!(coerce_weight(&value), 0.0, "{} should coerce to 0", value);
        }
    }

    #[test]
    fn test_long_radix_text_stays_large() {
        let weight = coerce_weight(&json!("0x10000000000000000"));
        assert_eq!(weight, 18446744073709551616.0);
        assert_eq!(coerce_weight(&json!("0xff")), 255.0);
    }

    #[test]
    fn test_true_is_one() {
        assert_eq!(coerce_weight(&json!(true)), 1.0);
    }

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(2.0), 2.0);
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_validate_weight() {
        assert_eq!(validate_weight(0.0).unwrap(), 0.0);
        assert_eq!(validate_weight(7.5).unwrap(), 7.5);
        assert!(matches!(validate_weight(-1.0), Err(Error::InvalidWeight(_))));
        assert!(matches!(validate_weight(f64::NAN), Err(Error::InvalidWeight(_))));
        assert!(matches!(
            validate_weight(f64::INFINITY),
            Err(Error::InvalidWeight(_))
        ));
    }

    #[test]
    fn test_weight_keeps_raw_value() {
        let weight: Weight = serde_json::from_value(json!("10")).unwrap();
        assert_eq!(weight.raw(), &json!("10"));
        assert_eq!(weight.value(), 10.0);
        assert_eq!(serde_json::to_value(&weight).unwrap(), json!("10"));
    }

    #[test]
    fn test_weight_from_f64() {
        assert_eq!(Weight::from(2.0).raw(), &json!(2.0));
        assert_eq!(Weight::from(f64::NAN).value(), 0.0);
    }
}
