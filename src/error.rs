//! Error types for the Homebridge MCP server
//!
//! Every public operation returns [`Result`]. Errors are turned into explicit
//! failed tool results at the MCP boundary, so a single bad request never
//! takes the server down.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Homebridge operations
pub type Result<T> = std::result::Result<T, HomebridgeError>;

/// Error types for Homebridge MCP operations
#[derive(Error, Debug)]
pub enum HomebridgeError {
    /// Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Authentication errors (rejected or missing bearer token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Characteristic format that has no validation rule
    #[error("Unsupported characteristic format: {0}")]
    UnsupportedFormat(String),

    /// Accessory or characteristic could not be resolved
    #[error("Not found: {0}")]
    NotFound(String),

    /// Value outside the legal domain of its format
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Accessory list retrieval failed
    #[error("Failed to fetch accessories: {0}")]
    Fetch(String),

    /// Characteristic write failed
    #[error("Failed to write characteristic: {0}")]
    Write(String),

    /// Request to the bridge exceeded the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid input errors (malformed tool arguments)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Connection errors (1000-1099)
    ConnectionTimeout,
    ConnectionLost,

    // Authentication errors (1100-1199)
    InvalidCredentials,

    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Device errors (1300-1399)
    AccessoryNotFound,
    CharacteristicWriteFailed,
    FormatUnsupported,

    // Data errors (1400-1499)
    ParsingFailed,
    InvalidInput,
    ValidationFailed,

    // Service errors (1600-1699)
    BridgeUnavailable,
    ExternalServiceError,

    // Internal errors (1900-1999)
    InternalError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::ConnectionTimeout => 1001,
            ErrorCode::ConnectionLost => 1003,

            ErrorCode::InvalidCredentials => 1101,

            ErrorCode::ConfigurationInvalid => 1202,

            ErrorCode::AccessoryNotFound => 1301,
            ErrorCode::CharacteristicWriteFailed => 1303,
            ErrorCode::FormatUnsupported => 1304,

            ErrorCode::ParsingFailed => 1401,
            ErrorCode::InvalidInput => 1402,
            ErrorCode::ValidationFailed => 1403,

            ErrorCode::BridgeUnavailable => 1601,
            ErrorCode::ExternalServiceError => 1603,

            ErrorCode::InternalError => 1901,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1000..=1099 => "connection",
            1100..=1199 => "authentication",
            1200..=1299 => "configuration",
            1300..=1399 => "device",
            1400..=1499 => "data",
            1600..=1699 => "service",
            1900..=1999 => "internal",
            _ => "unknown",
        }
    }
}

impl HomebridgeError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unsupported format error naming the offending format string
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a fetch error
    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a write error
    pub fn write<S: Into<String>>(msg: S) -> Self {
        Self::Write(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Map to structured error code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            HomebridgeError::Connection(_) => ErrorCode::ConnectionLost,
            HomebridgeError::Authentication(_) => ErrorCode::InvalidCredentials,
            HomebridgeError::Config(_) => ErrorCode::ConfigurationInvalid,
            HomebridgeError::UnsupportedFormat(_) => ErrorCode::FormatUnsupported,
            HomebridgeError::NotFound(_) => ErrorCode::AccessoryNotFound,
            HomebridgeError::Validation(_) => ErrorCode::ValidationFailed,
            HomebridgeError::Fetch(_) => ErrorCode::BridgeUnavailable,
            HomebridgeError::Write(_) => ErrorCode::CharacteristicWriteFailed,
            HomebridgeError::Timeout(_) => ErrorCode::ConnectionTimeout,
            HomebridgeError::InvalidInput(_) => ErrorCode::InvalidInput,
            HomebridgeError::Json(_) => ErrorCode::ParsingFailed,
            HomebridgeError::Http(_) => ErrorCode::ExternalServiceError,
            HomebridgeError::Io(_) => ErrorCode::InternalError,
        }
    }

    /// Errors caused by the caller's request rather than the bridge
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HomebridgeError::NotFound(_)
                | HomebridgeError::Validation(_)
                | HomebridgeError::InvalidInput(_)
                | HomebridgeError::UnsupportedFormat(_)
        )
    }

    /// Whether the same request may succeed if the caller tries again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HomebridgeError::Connection(_)
                | HomebridgeError::Timeout(_)
                | HomebridgeError::Fetch(_)
                | HomebridgeError::Http(_)
        )
    }

    /// Check if error indicates authentication issue
    pub fn is_auth_error(&self) -> bool {
        matches!(self, HomebridgeError::Authentication(_))
    }

    /// Machine-readable summary for tool responses
    pub fn to_json(&self) -> serde_json::Value {
        let code = self.to_error_code();
        serde_json::json!({
            "code": code.as_number(),
            "category": code.category(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_categories() {
        let err = HomebridgeError::not_found("accessory 'U9'");
        assert_eq!(err.to_error_code(), ErrorCode::AccessoryNotFound);
        assert_eq!(err.to_error_code().category(), "device");
        assert!(err.is_client_error());

        let err = HomebridgeError::fetch("connection refused");
        assert_eq!(err.to_error_code().as_number(), 1601);
        assert_eq!(err.to_error_code().category(), "service");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_unsupported_format_names_the_format() {
        let err = HomebridgeError::unsupported_format("uint64");
        assert_eq!(err.to_string(), "Unsupported characteristic format: uint64");
    }

    #[test]
    fn test_to_json_keeps_original_text() {
        let err = HomebridgeError::write("HTTP 500: plugin crashed");
        let json = err.to_json();
        assert_eq!(json["code"], 1303);
        assert_eq!(
            json["message"],
            "Failed to write characteristic: HTTP 500: plugin crashed"
        );
    }
}
