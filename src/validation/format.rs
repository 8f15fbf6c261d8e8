//! Characteristic formats, value rules and coercion
//!
//! Every characteristic declares a primitive `format`. The format decides
//! which values the bridge accepts, which JSON schema a generated tool
//! advertises, and how a loosely typed caller value (usually a string) is
//! turned into the typed value that gets written.
//!
//! Booleans are canonically JSON `true`/`false`. When coercing, the tokens
//! `"true"` and `"1"` mean on and every other string means off; there is no
//! third state.

use crate::client::CharacteristicValue;
use crate::error::{HomebridgeError, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Known characteristic formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacteristicFormat {
    String,
    Bool,
    UInt8,
    UInt16,
    UInt32,
    Int,
    Float,
    /// Opaque type-length-value blob, never writable through tools
    Tlv8,
}

impl CharacteristicFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::Int => "int",
            Self::Float => "float",
            Self::Tlv8 => "tlv8",
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Tlv8)
    }

    /// Validation rule for values of this format
    pub fn rule(&self) -> Result<ValidationRule> {
        Ok(match self {
            Self::String => ValidationRule::AnyString,
            Self::Bool => ValidationRule::Boolean,
            Self::UInt8 => ValidationRule::Integer {
                min: 0,
                max: i64::from(u8::MAX),
            },
            Self::UInt16 => ValidationRule::Integer {
                min: 0,
                max: i64::from(u16::MAX),
            },
            Self::UInt32 => ValidationRule::Integer {
                min: 0,
                max: i64::from(u32::MAX),
            },
            Self::Int => ValidationRule::Integer {
                min: i64::MIN,
                max: i64::MAX,
            },
            Self::Float => ValidationRule::Number {
                min: None,
                max: None,
            },
            Self::Tlv8 => return Err(HomebridgeError::unsupported_format(self.as_str())),
        })
    }

    /// Turn a caller-supplied value into a value of this format
    ///
    /// Already-typed input comes back unchanged. Integer widths are checked,
    /// never truncated.
    pub fn coerce(&self, raw: &CharacteristicValue) -> Result<CharacteristicValue> {
        use CharacteristicValue as V;

        match self {
            Self::String => Ok(match raw {
                V::String(s) => V::String(s.clone()),
                other => V::String(other.to_string()),
            }),
            Self::Bool => Ok(V::Bool(match raw {
                V::Bool(b) => *b,
                V::String(s) => {
                    let token = s.trim();
                    token.eq_ignore_ascii_case("true") || token == "1"
                }
                V::Integer(i) => *i == 1,
                V::Float(f) => *f == 1.0,
            })),
            Self::Float => {
                let value = match raw {
                    V::Float(f) => *f,
                    V::Integer(i) => *i as f64,
                    V::String(s) => s.trim().parse::<f64>().map_err(|_| {
                        HomebridgeError::validation(format!("'{s}' is not a valid float"))
                    })?,
                    V::Bool(b) => {
                        return Err(HomebridgeError::validation(format!(
                            "boolean {b} is not a valid float"
                        )))
                    }
                };
                if value.is_nan() {
                    return Err(HomebridgeError::validation("NaN is not a valid float"));
                }
                Ok(V::Float(value))
            }
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::Int => {
                let value = match raw {
                    V::Integer(i) => *i,
                    V::String(s) => s.trim().parse::<i64>().map_err(|_| {
                        HomebridgeError::validation(format!(
                            "'{s}' is not a valid {} integer",
                            self.as_str()
                        ))
                    })?,
                    V::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => *f as i64,
                    other => {
                        return Err(HomebridgeError::validation(format!(
                            "{other} is not a valid {} integer",
                            self.as_str()
                        )))
                    }
                };
                let coerced = V::Integer(value);
                self.rule()?.validate(&coerced)?;
                Ok(coerced)
            }
            Self::Tlv8 => Err(HomebridgeError::unsupported_format(self.as_str())),
        }
    }
}

impl FromStr for CharacteristicFormat {
    type Err = HomebridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(Self::String),
            "bool" => Ok(Self::Bool),
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "tlv8" => Ok(Self::Tlv8),
            other => Err(HomebridgeError::unsupported_format(other)),
        }
    }
}

impl fmt::Display for CharacteristicFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal value domain of a characteristic
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    AnyString,
    /// Exactly `true` or `false`
    Boolean,
    /// Inclusive integer range
    Integer { min: i64, max: i64 },
    /// Finite number, optionally bounded
    Number { min: Option<f64>, max: Option<f64> },
}

impl ValidationRule {
    /// Narrow the rule with a characteristic's own `minValue`/`maxValue`
    pub fn with_bounds(self, lower: Option<f64>, upper: Option<f64>) -> Self {
        match self {
            Self::Integer { mut min, mut max } => {
                if let Some(lower) = lower.filter(|v| v.is_finite()) {
                    min = min.max(lower.ceil() as i64);
                }
                if let Some(upper) = upper.filter(|v| v.is_finite()) {
                    max = max.min(upper.floor() as i64);
                }
                Self::Integer { min, max }
            }
            Self::Number { min, max } => Self::Number {
                min: lower.filter(|v| v.is_finite()).or(min),
                max: upper.filter(|v| v.is_finite()).or(max),
            },
            other => other,
        }
    }

    /// JSON schema fragment describing accepted values
    pub fn input_schema(&self) -> Value {
        match self {
            Self::AnyString => json!({ "type": "string" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Integer { min, max } => {
                let mut schema = json!({ "type": "integer" });
                if *min != i64::MIN {
                    schema["minimum"] = json!(min);
                }
                if *max != i64::MAX {
                    schema["maximum"] = json!(max);
                }
                schema
            }
            Self::Number { min, max } => {
                let mut schema = json!({ "type": "number" });
                if let Some(min) = min {
                    schema["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    schema["maximum"] = json!(max);
                }
                schema
            }
        }
    }

    /// Check a typed value against the rule
    pub fn validate(&self, value: &CharacteristicValue) -> Result<()> {
        use CharacteristicValue as V;

        match (self, value) {
            (Self::AnyString, V::String(_)) | (Self::Boolean, V::Bool(_)) => Ok(()),
            (Self::Integer { min, max }, V::Integer(i)) => {
                if i < min || i > max {
                    Err(HomebridgeError::validation(format!(
                        "{i} is outside the allowed range {min}..={max}"
                    )))
                } else {
                    Ok(())
                }
            }
            (Self::Number { min, max }, V::Float(f)) => check_number(*f, *min, *max),
            (Self::Number { min, max }, V::Integer(i)) => check_number(*i as f64, *min, *max),
            (rule, value) => Err(HomebridgeError::validation(format!(
                "{value} does not match {}",
                rule.describe()
            ))),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::AnyString => "a string",
            Self::Boolean => "a boolean",
            Self::Integer { .. } => "an integer",
            Self::Number { .. } => "a number",
        }
    }
}

fn check_number(n: f64, min: Option<f64>, max: Option<f64>) -> Result<()> {
    if !n.is_finite() {
        return Err(HomebridgeError::validation(format!("{n} is not a finite number")));
    }
    if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
        return Err(HomebridgeError::validation(format!(
            "{n} is outside the allowed range {}..={}",
            min.map_or("-inf".to_string(), |v| v.to_string()),
            max.map_or("inf".to_string(), |v| v.to_string()),
        )));
    }
    Ok(())
}

/// Validation rule for a declared format string
pub fn rule_for(format: &str) -> Result<ValidationRule> {
    format.parse::<CharacteristicFormat>()?.rule()
}

/// Coerce a raw value to the declared format string
pub fn coerce(format: &str, raw: &CharacteristicValue) -> Result<CharacteristicValue> {
    format.parse::<CharacteristicFormat>()?.coerce(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use CharacteristicValue as V;

    #[rstest]
    #[case("string", ValidationRule::AnyString)]
    #[case("bool", ValidationRule::Boolean)]
    #[case("uint8", ValidationRule::Integer { min: 0, max: 255 })]
    #[case("uint16", ValidationRule::Integer { min: 0, max: 65535 })]
    #[case("uint32", ValidationRule::Integer { min: 0, max: 4_294_967_295 })]
    #[case("int", ValidationRule::Integer { min: i64::MIN, max: i64::MAX })]
    #[case("float", ValidationRule::Number { min: None, max: None })]
    fn test_rule_for_known_formats(#[case] format: &str, #[case] expected: ValidationRule) {
        assert_eq!(rule_for(format).unwrap(), expected);
    }

    #[rstest]
    #[case("tlv8")]
    #[case("data")]
    #[case("unint8")]
    #[case("")]
    fn test_unsupported_formats_are_surfaced(#[case] format: &str) {
        let err = rule_for(format).unwrap_err();
        match err {
            HomebridgeError::UnsupportedFormat(name) => assert_eq!(name, format),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_coerce_is_idempotent_on_typed_input() {
        assert_eq!(coerce("bool", &V::Bool(true)).unwrap(), V::Bool(true));
        assert_eq!(coerce("bool", &V::Bool(false)).unwrap(), V::Bool(false));
        assert_eq!(coerce("uint8", &V::Integer(42)).unwrap(), V::Integer(42));
        assert_eq!(coerce("float", &V::Float(12.5)).unwrap(), V::Float(12.5));
        assert_eq!(
            coerce("string", &V::String("Lamp".into())).unwrap(),
            V::String("Lamp".into())
        );
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("1", true)]
    #[case(" true ", true)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("yes", false)]
    #[case("", false)]
    fn test_bool_tokens(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(
            coerce("bool", &V::String(raw.into())).unwrap(),
            V::Bool(expected)
        );
    }

    #[test]
    fn test_integer_widths_reject_out_of_range() {
        let err = coerce("uint8", &V::String("1000".into())).unwrap_err();
        assert!(matches!(err, HomebridgeError::Validation(_)));

        assert!(coerce("uint8", &V::String("-1".into())).is_err());
        assert!(coerce("uint16", &V::Integer(65_536)).is_err());
        assert!(coerce("uint32", &V::Integer(4_294_967_296)).is_err());
        assert_eq!(
            coerce("uint32", &V::String("4294967295".into())).unwrap(),
            V::Integer(4_294_967_295)
        );
        assert_eq!(coerce("int", &V::String("-20".into())).unwrap(), V::Integer(-20));
    }

    #[test]
    fn test_integer_parse_failures() {
        assert!(coerce("uint8", &V::String("abc".into())).is_err());
        assert!(coerce("uint8", &V::String("1.5".into())).is_err());
        assert!(coerce("uint8", &V::Float(1.5)).is_err());
        assert_eq!(coerce("uint8", &V::Float(100.0)).unwrap(), V::Integer(100));
        assert!(coerce("int", &V::Bool(true)).is_err());
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(coerce("float", &V::String("100".into())).unwrap(), V::Float(100.0));
        assert_eq!(coerce("float", &V::Integer(3)).unwrap(), V::Float(3.0));
        assert!(coerce("float", &V::String("bright".into())).is_err());
        assert!(coerce("float", &V::String("NaN".into())).is_err());
    }

    #[test]
    fn test_string_passes_through() {
        assert_eq!(
            coerce("string", &V::Integer(5)).unwrap(),
            V::String("5".into())
        );
    }

    #[test]
    fn test_tlv8_cannot_be_coerced() {
        let err = coerce("tlv8", &V::String("AQID".into())).unwrap_err();
        assert!(matches!(err, HomebridgeError::UnsupportedFormat(f) if f == "tlv8"));
    }

    #[test]
    fn test_bounds_narrow_rules() {
        let hue = rule_for("float").unwrap().with_bounds(Some(0.0), Some(360.0));
        assert!(hue.validate(&V::Float(212.0)).is_ok());
        assert!(hue.validate(&V::Float(361.0)).is_err());
        assert_eq!(
            hue.input_schema(),
            json!({ "type": "number", "minimum": 0.0, "maximum": 360.0 })
        );

        let brightness = rule_for("int").unwrap().with_bounds(Some(0.0), Some(100.0));
        assert_eq!(brightness, ValidationRule::Integer { min: 0, max: 100 });
        assert!(brightness.validate(&V::Integer(101)).is_err());
    }

    #[test]
    fn test_input_schema_shapes() {
        assert_eq!(rule_for("bool").unwrap().input_schema(), json!({ "type": "boolean" }));
        assert_eq!(
            rule_for("uint8").unwrap().input_schema(),
            json!({ "type": "integer", "minimum": 0, "maximum": 255 })
        );
        assert_eq!(rule_for("int").unwrap().input_schema(), json!({ "type": "integer" }));
    }

    #[test]
    fn test_validate_rejects_wrong_types() {
        assert!(ValidationRule::Boolean.validate(&V::String("true".into())).is_err());
        assert!(ValidationRule::AnyString.validate(&V::Integer(1)).is_err());
    }
}
