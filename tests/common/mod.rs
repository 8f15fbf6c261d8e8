//! Common test utilities

pub mod homebridge_mock;
