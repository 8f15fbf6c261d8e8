//! Integration with the PulseEngine MCP framework

pub mod backend;

pub use backend::HomebridgeBackend;
