//! Configuration management for the Homebridge MCP server

use crate::error::{HomebridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{env, time::Duration};
use url::Url;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Homebridge connection configuration
    pub homebridge: HomebridgeConfig,

    /// Credentials for the Homebridge UI API
    #[serde(skip_serializing)]
    pub credentials: HomebridgeCredentials,

    /// MCP server configuration
    pub mcp: McpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Homebridge UI connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomebridgeConfig {
    /// Homebridge UI URL (e.g., "http://homebridge.local:8581")
    pub url: Url,

    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Enable SSL/TLS verification
    pub verify_ssl: bool,

    /// Keep the first fetched accessory list in memory for the process lifetime
    pub cache_accessories: bool,
}

/// Credentials for the Homebridge UI API
///
/// A bearer token wins when present; otherwise username and password are
/// exchanged for a token on first use.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct HomebridgeCredentials {
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for HomebridgeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomebridgeCredentials")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HomebridgeCredentials {
    /// Whether any way to authenticate is configured
    pub fn is_configured(&self) -> bool {
        self.token.is_some() || (self.username.is_some() && self.password.is_some())
    }
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Server name for MCP identification
    pub name: String,

    /// Server version
    pub version: String,

    /// Generate one tool per writable characteristic
    pub generate_characteristic_tools: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Enable structured JSON logging
    pub json_format: bool,

    /// Also log to this file
    pub file: Option<String>,
}

impl Default for HomebridgeConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("http://127.0.0.1:8581").expect("static URL is valid"),
            timeout: Duration::from_secs(10),
            verify_ssl: true,
            cache_accessories: true,
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            name: "homebridge".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generate_characteristic_tools: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: None,
        }
    }
}

/// Parse a Homebridge UI address, accepting bare `host:port` as plain HTTP
pub fn parse_homebridge_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    with_scheme
        .parse()
        .map_err(|e| HomebridgeError::config(format!("Invalid Homebridge URL '{raw}': {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(HomebridgeError::config(format!(
            "Invalid {name}: {other}. Use true or false"
        ))),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config: ServerConfig = toml::from_str(&text).map_err(|e| {
            HomebridgeError::config(format!("Invalid config file {}: {e}", path.display()))
        })?;
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("HOMEBRIDGE_URL") {
            self.homebridge.url = parse_homebridge_url(&url)?;
        }

        if let Ok(token) = env::var("HOMEBRIDGE_TOKEN") {
            self.credentials.token = Some(token);
        }

        if let Ok(username) = env::var("HOMEBRIDGE_USERNAME") {
            self.credentials.username = Some(username);
        }

        if let Ok(password) = env::var("HOMEBRIDGE_PASSWORD") {
            self.credentials.password = Some(password);
        }

        if let Ok(timeout) = env::var("HOMEBRIDGE_TIMEOUT") {
            self.homebridge.timeout = Duration::from_secs(timeout.parse().map_err(|e| {
                HomebridgeError::config(format!("Invalid HOMEBRIDGE_TIMEOUT: {e}"))
            })?);
        }

        if let Ok(cache) = env::var("HOMEBRIDGE_CACHE") {
            self.homebridge.cache_accessories = parse_bool("HOMEBRIDGE_CACHE", &cache)?;
        }

        if let Ok(level) = env::var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration before the server starts
    pub fn validate(&self) -> Result<()> {
        if self.homebridge.url.host().is_none() {
            return Err(HomebridgeError::config("Invalid Homebridge URL - missing host"));
        }

        if !matches!(self.homebridge.url.scheme(), "http" | "https") {
            return Err(HomebridgeError::config(format!(
                "Unsupported Homebridge URL scheme: {}",
                self.homebridge.url.scheme()
            )));
        }

        if !self.credentials.is_configured() {
            return Err(HomebridgeError::config(
                "Homebridge credentials required. Set HOMEBRIDGE_TOKEN, or HOMEBRIDGE_USERNAME and HOMEBRIDGE_PASSWORD",
            ));
        }

        if self.homebridge.timeout.is_zero() {
            return Err(HomebridgeError::config("Timeout must be greater than zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.homebridge.url.as_str(), "http://127.0.0.1:8581/");
        assert!(config.homebridge.cache_accessories);
        assert!(config.mcp.generate_characteristic_tools);
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_connection_settings() {
        temp_env::with_vars(
            [
                ("HOMEBRIDGE_URL", Some("homebridge.local:8581")),
                ("HOMEBRIDGE_TOKEN", Some("secret-token")),
                ("HOMEBRIDGE_TIMEOUT", Some("3")),
                ("HOMEBRIDGE_CACHE", Some("false")),
                ("HOMEBRIDGE_USERNAME", None),
                ("HOMEBRIDGE_PASSWORD", None),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.homebridge.url.as_str(), "http://homebridge.local:8581/");
                assert_eq!(config.credentials.token.as_deref(), Some("secret-token"));
                assert_eq!(config.homebridge.timeout, Duration::from_secs(3));
                assert!(!config.homebridge.cache_accessories);
                assert!(config.validate().is_ok());
            },
        );
    }

    #[test]
    #[serial]
    fn test_invalid_cache_flag_is_rejected() {
        temp_env::with_var("HOMEBRIDGE_CACHE", Some("sometimes"), || {
            let err = ServerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("HOMEBRIDGE_CACHE"));
        });
    }

    #[test]
    fn test_parse_homebridge_url() {
        assert_eq!(
            parse_homebridge_url("192.168.1.20:8581").unwrap().as_str(),
            "http://192.168.1.20:8581/"
        );
        assert_eq!(
            parse_homebridge_url("https://hb.example.com").unwrap().scheme(),
            "https"
        );
        assert!(parse_homebridge_url("http://").is_err());
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let credentials = HomebridgeCredentials {
            token: Some("eyJhbGciOi".into()),
            username: Some("admin".into()),
            password: Some("hunter2".into()),
        };
        let printed = format!("{credentials:?}");
        assert!(!printed.contains("eyJhbGciOi"));
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("admin"));
    }
}
