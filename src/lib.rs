//! Homebridge MCP Server implementation in Rust
//!
//! This crate provides a Model Context Protocol (MCP) server that exposes the
//! accessories of a Homebridge instance as tools, so an agent can list
//! accessories and set their characteristics (on/off, brightness, hue, ...).
//!
//! # Features
//!
//! - `list_accessories`, `set_characteristic` and `set_characteristics_batch`
//! - One generated tool per writable characteristic
//! - Value coercion and validation against each characteristic's format
//! - Optional in-memory accessory cache
//! - Bearer token or username/password authentication against the Homebridge UI

// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod framework_integration;
pub mod logging;
pub mod services;
pub mod tools;
pub mod validation;

// Test support modules - available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use error::{HomebridgeError, Result};
pub use framework_integration::HomebridgeBackend;
