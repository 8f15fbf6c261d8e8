//! Value validation for characteristic writes
//!
//! [`format`] holds the closed set of characteristic formats. This module
//! adds argument extraction for tool calls, so every tool rejects malformed
//! input the same way before anything reaches the bridge.

pub mod format;

pub use format::{coerce, rule_for, CharacteristicFormat, ValidationRule};

use crate::client::CharacteristicValue;
use crate::error::{HomebridgeError, Result};
use serde_json::Value;

/// Extract a required string argument
pub fn required_string(arguments: &Option<Value>, name: &str) -> Result<String> {
    arguments
        .as_ref()
        .and_then(|args| args.get(name))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| HomebridgeError::invalid_input(format!("Missing required parameter: {name}")))
}

/// Extract an optional boolean argument
pub fn optional_bool(arguments: &Option<Value>, name: &str) -> Result<Option<bool>> {
    match arguments.as_ref().and_then(|args| args.get(name)) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(HomebridgeError::invalid_input(format!(
            "Parameter {name} must be a boolean, got {other}"
        ))),
    }
}

/// Extract the raw characteristic value (string, number or boolean)
pub fn required_value(arguments: &Option<Value>, name: &str) -> Result<CharacteristicValue> {
    let raw = arguments
        .as_ref()
        .and_then(|args| args.get(name))
        .ok_or_else(|| HomebridgeError::invalid_input(format!("Missing required parameter: {name}")))?;

    CharacteristicValue::from_json(raw).ok_or_else(|| {
        HomebridgeError::invalid_input(format!(
            "Parameter {name} must be a string, number or boolean, got {raw}"
        ))
    })
}
