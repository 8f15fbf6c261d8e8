//! Homebridge backend implementation for the MCP framework
//!
//! Implements `McpBackend` on top of the tool layer. Tools are the only
//! capability; resources and prompts are empty.

use async_trait::async_trait;
use pulseengine_mcp_protocol::*;
use pulseengine_mcp_server::backend::{BackendError, McpBackend};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::client::{HomebridgeClient, HomebridgeHttpClient};
use crate::error::HomebridgeError;
use crate::services::AccessoryDirectory;
use crate::tools::{static_tool_definitions, ToolContext, ToolDefinition, ToolResponse};
use crate::ServerConfig;

/// Convert HomebridgeError to BackendError
impl From<HomebridgeError> for BackendError {
    fn from(err: HomebridgeError) -> Self {
        use HomebridgeError::*;
        match err {
            Connection(msg) | Fetch(msg) | Timeout(msg) => BackendError::connection(msg),
            Http(e) => BackendError::connection(e.to_string()),

            Authentication(msg) | Config(msg) | InvalidInput(msg) => {
                BackendError::configuration(msg)
            }

            NotFound(msg) | UnsupportedFormat(msg) => BackendError::not_supported(msg),

            _ => BackendError::internal(err.to_string()),
        }
    }
}

/// MCP backend serving Homebridge accessories as tools
#[derive(Clone)]
pub struct HomebridgeBackend {
    config: ServerConfig,
    tools: ToolContext,
}

impl HomebridgeBackend {
    /// Build the backend around an existing client
    pub fn with_client(config: ServerConfig, client: Arc<dyn HomebridgeClient>) -> Self {
        let directory = Arc::new(AccessoryDirectory::new(client));
        let tools = ToolContext::new(
            directory,
            config.homebridge.cache_accessories,
            config.mcp.generate_characteristic_tools,
        );
        Self { config, tools }
    }

    /// Validate configuration and create the HTTP client
    pub fn from_config(config: ServerConfig) -> crate::Result<Self> {
        config.validate()?;
        let client =
            HomebridgeHttpClient::new(&config.homebridge, config.credentials.clone())?;
        info!("Homebridge client targets {}", client.base_url());
        Ok(Self::with_client(config, Arc::new(client)))
    }

    pub fn tool_context(&self) -> &ToolContext {
        &self.tools
    }

    /// Tool list, falling back to the static tools when the bridge is unreachable
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        match self.tools.tool_definitions().await {
            Ok(definitions) => definitions,
            Err(e) => {
                warn!("Could not generate characteristic tools: {e}");
                static_tool_definitions()
            }
        }
    }
}

fn to_tool(definition: ToolDefinition) -> Tool {
    Tool {
        name: definition.name,
        description: definition.description,
        input_schema: definition.input_schema,
    }
}

fn to_content(response: &ToolResponse) -> Content {
    Content::text(
        serde_json::to_string_pretty(response)
            .unwrap_or_else(|_| "Failed to serialize response".to_string()),
    )
}

#[async_trait]
impl McpBackend for HomebridgeBackend {
    type Error = BackendError;
    type Config = ServerConfig;

    async fn initialize(config: Self::Config) -> std::result::Result<Self, Self::Error> {
        info!("Initializing Homebridge backend");
        Self::from_config(config).map_err(BackendError::from)
    }

    fn get_server_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.mcp.name.clone(),
                version: self.config.mcp.version.clone(),
            },
            instructions: Some(
                "Homebridge accessory control via MCP. Call list_accessories to discover \
                 accessory ids and characteristic types, then set_characteristic or a \
                 generated per-characteristic tool to change them."
                    .to_string(),
            ),
        }
    }

    async fn health_check(&self) -> std::result::Result<(), Self::Error> {
        match self.tools.directory.client().health_check().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(BackendError::connection(
                "Health check failed: Homebridge not reachable",
            )),
            Err(e) => {
                error!("Homebridge health check error: {e}");
                Err(e.into())
            }
        }
    }

    async fn list_tools(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListToolsResult, Self::Error> {
        let tools: Vec<Tool> = self
            .tool_definitions()
            .await
            .into_iter()
            .map(to_tool)
            .collect();
        debug!("Listed {} tools", tools.len());

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParam,
    ) -> std::result::Result<CallToolResult, Self::Error> {
        debug!("Calling tool: {}", params.name);

        let response = self.tools.call_tool(&params.name, &params.arguments).await;
        if response.is_error() {
            error!(
                "Tool {} failed: {}",
                params.name,
                response.message.as_deref().unwrap_or("unknown error")
            );
            Ok(CallToolResult::error_text(format!(
                "Tool execution failed: {}",
                response.message.as_deref().unwrap_or("unknown error")
            )))
        } else {
            info!("Tool {} executed successfully", params.name);
            Ok(CallToolResult::success(vec![to_content(&response)]))
        }
    }

    async fn list_resources(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListResourcesResult, Self::Error> {
        Ok(ListResourcesResult {
            resources: vec![],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        params: ReadResourceRequestParam,
    ) -> std::result::Result<ReadResourceResult, Self::Error> {
        Err(BackendError::not_supported(format!(
            "Resource not found: {}",
            params.uri
        )))
    }

    async fn list_prompts(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListPromptsResult, Self::Error> {
        Ok(ListPromptsResult {
            prompts: vec![],
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        params: GetPromptRequestParam,
    ) -> std::result::Result<GetPromptResult, Self::Error> {
        Err(BackendError::not_supported(format!(
            "Prompt not found: {}",
            params.name
        )))
    }
}
