//! Homebridge MCP Server - Main Entry Point
//!
//! Serves Homebridge accessories over the MCP stdio transport.

use pulseengine_mcp_auth::{AuthConfig, AuthenticationManager};
use pulseengine_mcp_server::{middleware::MiddlewareStack, GenericServerHandler};
use pulseengine_mcp_transport::{create_transport, Transport, TransportConfig};

use homebridge_mcp::config::parse_homebridge_url;
use homebridge_mcp::{logging, HomebridgeBackend, HomebridgeError, Result, ServerConfig};

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Homebridge MCP Server Configuration
#[derive(Parser, Debug)]
#[command(name = "homebridge-mcp-server")]
#[command(about = "MCP server exposing Homebridge accessories as tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// TOML configuration file
    #[arg(long, short, env = "HOMEBRIDGE_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Homebridge UI URL
    #[arg(long, env = "HOMEBRIDGE_URL")]
    url: Option<String>,

    /// Bearer token for the Homebridge UI API
    #[arg(long, env = "HOMEBRIDGE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Homebridge UI username (used when no token is given)
    #[arg(long, env = "HOMEBRIDGE_USERNAME")]
    username: Option<String>,

    /// Homebridge UI password
    #[arg(long, env = "HOMEBRIDGE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Always fetch accessories from the bridge instead of caching them
    #[arg(long)]
    no_cache: bool,

    /// Only expose the static tools
    #[arg(long)]
    no_generated_tools: bool,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Configuration file (or environment) with command line overrides on top
    fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::from_env()?,
        };

        if let Some(url) = &self.url {
            config.homebridge.url = parse_homebridge_url(url)?;
        }
        if let Some(token) = &self.token {
            config.credentials.token = Some(token.clone());
        }
        if let Some(username) = &self.username {
            config.credentials.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.credentials.password = Some(password.clone());
        }
        if self.no_cache {
            config.homebridge.cache_accessories = false;
        }
        if self.no_generated_tools {
            config.mcp.generate_characteristic_tools = false;
        }
        if self.debug {
            config.logging.level = "debug".to_string();
        }
        if self.log_json {
            config.logging.json_format = true;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    let _log_guard = logging::init_logging(&config.logging)?;

    info!("Starting Homebridge MCP Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Homebridge: {}", config.homebridge.url);

    let backend = HomebridgeBackend::from_config(config)?;
    info!("Homebridge backend initialized");

    let auth_manager = AuthenticationManager::new(AuthConfig {
        enabled: false,
        ..Default::default()
    })
    .await
    .map_err(|e| HomebridgeError::config(e.to_string()))?;

    let handler = GenericServerHandler::new(backend, Arc::new(auth_manager), MiddlewareStack::new());

    let mut transport: Box<dyn Transport> = create_transport(TransportConfig::Stdio)
        .map_err(|e| HomebridgeError::connection(e.to_string()))?;

    info!("Starting stdio transport");
    transport
        .start(Box::new(move |req| {
            let handler = handler.clone();
            Box::pin(async move {
                handler.handle_request(req).await.unwrap_or_else(|e| {
                    tracing::error!("Request handling error: {}", e);
                    pulseengine_mcp_protocol::Response {
                        jsonrpc: "2.0".to_string(),
                        id: None,
                        result: None,
                        error: Some(pulseengine_mcp_protocol::Error::internal_error(
                            e.to_string(),
                        )),
                    }
                })
            })
        }))
        .await
        .map_err(|e| HomebridgeError::connection(e.to_string()))?;

    info!("Server stopped (stdin closed)");
    Ok(())
}
