//! Logging setup
//!
//! Log output always goes to stderr because stdout carries the MCP stream.
//! A file can be added; it rotates daily.

use crate::config::LoggingConfig;
use crate::error::{HomebridgeError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the filter from `LoggingConfig::level` (which `RUST_LOG` overrides at config load)
fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| HomebridgeError::config(format!("Invalid log level '{level}': {e}")))
}

fn stderr_layer(json: bool) -> BoxedLayer {
    if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    }
}

fn file_layer(path: &Path, json: bool) -> Result<(BoxedLayer, WorkerGuard)> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    if !directory.as_os_str().is_empty() {
        std::fs::create_dir_all(directory)?;
    }
    let file_name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("homebridge-mcp.log"));

    let appender = tracing_appender::rolling::daily(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = if json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer().with_ansi(false).with_writer(writer).boxed()
    };
    Ok((layer, guard))
}

/// Install the global subscriber
///
/// The returned guard must be kept alive while file logging is in use.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&config.level)?;

    let mut layers = vec![stderr_layer(config.json_format)];
    let mut guard = None;
    if let Some(path) = &config.file {
        let (layer, file_guard) = file_layer(Path::new(path), config.json_format)?;
        layers.push(layer);
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| HomebridgeError::config(format!("Failed to initialize logging: {e}")))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        assert!(env_filter("info").is_ok());
        assert!(env_filter("homebridge_mcp=debug,warn").is_ok());
        assert!(env_filter("homebridge_mcp=loud").is_err());
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("server.log");

        let (_layer, _guard) = file_layer(&path, false).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
