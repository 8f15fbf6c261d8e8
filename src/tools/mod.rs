//! MCP tools for Homebridge accessory control
//!
//! Three static tools are always available. When enabled, one extra tool per
//! writable characteristic is generated from the live accessory list (see
//! [`generator`]). Every invocation ends in a [`ToolResponse`]; failures are
//! reported in the response, never raised to the server loop.

pub mod accessories;
pub mod batch;
pub mod generator;

use crate::error::{HomebridgeError, Result};
use crate::services::{AccessoryDirectory, ValueWriter, WriteRequest};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub use generator::{generate, normalize_tool_name, ToolDescriptor, ToolGeneration};

pub const LIST_ACCESSORIES: &str = "list_accessories";
pub const SET_CHARACTERISTIC: &str = "set_characteristic";
pub const SET_CHARACTERISTICS_BATCH: &str = "set_characteristics_batch";

/// Standard MCP tool response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Status of the operation
    pub status: String,

    /// Response data
    pub data: Value,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ToolResponse {
    /// Create successful response
    pub fn success(data: Value) -> Self {
        Self {
            status: "success".to_string(),
            data,
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create successful response with message
    pub fn success_with_message(data: Value, message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::success(data)
        }
    }

    /// Create error response carrying the error code and original text
    pub fn error(err: &HomebridgeError) -> Self {
        Self {
            status: "error".to_string(),
            data: err.to_json(),
            message: Some(err.to_string()),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create response from Result
    pub fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result.and_then(|data| Ok(serde_json::to_value(data)?)) {
            Ok(data) => Self::success(data),
            Err(e) => Self::error(&e),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

/// Name, description and input schema of one tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl From<&ToolDescriptor> for ToolDefinition {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema(),
        }
    }
}

/// Arguments of `list_accessories`
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListAccessoriesParams {
    /// Bypass the accessory cache and ask the bridge
    #[serde(default)]
    pub refresh: Option<bool>,
}

/// Arguments of `set_characteristic`
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCharacteristicParams {
    /// Accessory `uniqueId` as reported by `list_accessories`
    pub accessory_id: String,
    /// Characteristic type, e.g. `On`, `Brightness` or `Hue`
    pub characteristic_type: String,
    /// New value (string, number or boolean); coerced to the characteristic's format
    pub value: Value,
}

/// Arguments of `set_characteristics_batch`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetCharacteristicsBatchParams {
    /// Writes to issue; each one succeeds or fails on its own
    pub writes: Vec<WriteRequest>,
}

/// JSON schema of a parameter model, as advertised to MCP clients
pub fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| {
        serde_json::json!({ "type": "object" })
    })
}

/// Tools that exist regardless of the accessory list
pub fn static_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: LIST_ACCESSORIES.to_string(),
            description: "List all Homebridge accessories with their characteristics, formats, \
                          current values and whether they can be written"
                .to_string(),
            input_schema: schema_of::<ListAccessoriesParams>(),
        },
        ToolDefinition {
            name: SET_CHARACTERISTIC.to_string(),
            description: "Set one characteristic (e.g. On, Brightness, Hue) of a Homebridge \
                          accessory identified by its uniqueId"
                .to_string(),
            input_schema: schema_of::<SetCharacteristicParams>(),
        },
        ToolDefinition {
            name: SET_CHARACTERISTICS_BATCH.to_string(),
            description: "Set several characteristics at once. Writes run concurrently and \
                          each reports its own result"
                .to_string(),
            input_schema: schema_of::<SetCharacteristicsBatchParams>(),
        },
    ]
}

/// Shared tool context for all MCP tools
#[derive(Clone)]
pub struct ToolContext {
    pub directory: Arc<AccessoryDirectory>,
    pub writer: Arc<ValueWriter>,
    /// Cache policy for reads made on behalf of tools
    pub use_cache: bool,
    /// Expose per-characteristic tools
    pub generate_characteristic_tools: bool,
}

impl ToolContext {
    pub fn new(
        directory: Arc<AccessoryDirectory>,
        use_cache: bool,
        generate_characteristic_tools: bool,
    ) -> Self {
        let writer = Arc::new(ValueWriter::new(Arc::clone(&directory), use_cache));
        Self {
            directory,
            writer,
            use_cache,
            generate_characteristic_tools,
        }
    }

    /// Generate per-characteristic tools from the current accessory list
    pub async fn generated_tools(&self) -> Result<ToolGeneration> {
        if !self.generate_characteristic_tools {
            return Ok(ToolGeneration::default());
        }
        let accessories = self.directory.fetch(self.use_cache).await?;
        Ok(generate(&accessories))
    }

    /// Static tools plus generated ones
    pub async fn tool_definitions(&self) -> Result<Vec<ToolDefinition>> {
        let mut definitions = static_tool_definitions();
        let generation = self.generated_tools().await?;
        for skipped in &generation.skipped {
            debug!("No tool for {:?}", skipped);
        }
        definitions.extend(generation.tools.iter().map(ToolDefinition::from));
        Ok(definitions)
    }

    /// Run a tool by name
    pub async fn call_tool(&self, name: &str, arguments: &Option<Value>) -> ToolResponse {
        debug!("Dispatching tool {name}");
        match name {
            LIST_ACCESSORIES => accessories::list_accessories(self, arguments).await,
            SET_CHARACTERISTIC => accessories::set_characteristic(self, arguments).await,
            SET_CHARACTERISTICS_BATCH => batch::set_characteristics_batch(self, arguments).await,
            other => accessories::call_generated_tool(self, other, arguments).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HomebridgeClient;
    use crate::mock::{fixtures, MockHomebridgeClient};
    use serde_json::json;

    pub(crate) fn context(mock: &Arc<MockHomebridgeClient>) -> ToolContext {
        let directory = Arc::new(AccessoryDirectory::new(
            Arc::clone(mock) as Arc<dyn HomebridgeClient>
        ));
        ToolContext::new(directory, true, true)
    }

    #[test]
    fn test_static_tool_schemas() {
        let tools = static_tool_definitions();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![LIST_ACCESSORIES, SET_CHARACTERISTIC, SET_CHARACTERISTICS_BATCH]
        );

        let set = &tools[1].input_schema;
        assert_eq!(
            set["required"],
            json!(["accessoryId", "characteristicType", "value"])
        );
        assert!(tools[2].input_schema["properties"]["writes"].is_object());
    }

    #[test]
    fn test_error_response_keeps_text() {
        let response = ToolResponse::error(&HomebridgeError::not_found("accessory 'U9'"));
        assert!(response.is_error());
        assert_eq!(response.message.as_deref(), Some("Not found: accessory 'U9'"));
        assert_eq!(response.data["code"], 1301);
    }

    #[tokio::test]
    async fn test_tool_definitions_include_generated() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::lamp()]));
        let definitions = context(&mock).tool_definitions().await.unwrap();

        assert_eq!(definitions.len(), 4);
        assert_eq!(definitions[3].name, "lamp_on");
        assert_eq!(
            definitions[3].input_schema["properties"]["value"]["type"],
            "boolean"
        );
    }

    #[tokio::test]
    async fn test_generation_can_be_disabled() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::lamp()]));
        let directory = Arc::new(AccessoryDirectory::new(
            Arc::clone(&mock) as Arc<dyn HomebridgeClient>
        ));
        let ctx = ToolContext::new(directory, true, false);

        assert_eq!(ctx.tool_definitions().await.unwrap().len(), 3);
        assert_eq!(mock.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_response() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::lamp()]));
        let response = context(&mock).call_tool("no_such_tool", &None).await;

        assert!(response.is_error());
        assert!(mock.writes().is_empty());
    }
}
