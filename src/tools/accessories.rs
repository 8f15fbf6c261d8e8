//! Accessory listing and single characteristic writes

use crate::client::{Accessory, ServiceCharacteristic};
use crate::error::{HomebridgeError, Result};
use crate::tools::{ToolContext, ToolResponse};
use crate::validation::{optional_bool, required_string, required_value};
use serde_json::{json, Value};
use tracing::debug;

/// `list_accessories`: every accessory with its characteristics
pub async fn list_accessories(ctx: &ToolContext, arguments: &Option<Value>) -> ToolResponse {
    let refresh = match optional_bool(arguments, "refresh") {
        Ok(refresh) => refresh.unwrap_or(false),
        Err(e) => return ToolResponse::error(&e),
    };

    let accessories = match ctx.directory.fetch(ctx.use_cache && !refresh).await {
        Ok(accessories) => accessories,
        Err(e) => return ToolResponse::error(&e),
    };

    let summaries: Vec<Value> = accessories.iter().map(accessory_summary).collect();
    ToolResponse::success_with_message(
        json!({
            "count": summaries.len(),
            "accessories": summaries,
        }),
        format!("Found {} accessories", summaries.len()),
    )
}

fn accessory_summary(accessory: &Accessory) -> Value {
    let info = &accessory.accessory_information;
    json!({
        "uniqueId": accessory.unique_id,
        "name": accessory.display_name(),
        "type": accessory.human_type,
        "manufacturer": info.manufacturer,
        "model": info.model,
        "serialNumber": info.serial_number,
        "firmwareRevision": info.firmware_revision,
        "characteristics": accessory
            .service_characteristics
            .iter()
            .map(characteristic_summary)
            .collect::<Vec<_>>(),
    })
}

fn characteristic_summary(c: &ServiceCharacteristic) -> Value {
    let mut summary = json!({
        "type": c.characteristic_type,
        "description": c.description,
        "format": c.format,
        "value": c.value,
        "canRead": c.can_read,
        "canWrite": c.can_write,
    });
    for (key, field) in [
        ("minValue", c.min_value),
        ("maxValue", c.max_value),
        ("minStep", c.min_step),
    ] {
        if let Some(v) = field {
            summary[key] = json!(v);
        }
    }
    if let Some(unit) = &c.unit {
        summary["unit"] = json!(unit);
    }
    summary
}

/// `set_characteristic`: one write by accessory id and characteristic type
pub async fn set_characteristic(ctx: &ToolContext, arguments: &Option<Value>) -> ToolResponse {
    let result: Result<_> = async {
        let accessory_id = required_string(arguments, "accessoryId")?;
        let characteristic_type = required_string(arguments, "characteristicType")?;
        let value = required_value(arguments, "value")?;
        ctx.writer
            .write(&accessory_id, &characteristic_type, &value)
            .await
    }
    .await;

    match result {
        Ok(outcome) => {
            let message = format!(
                "Set {} on {} to {}",
                outcome.characteristic_type, outcome.accessory_id, outcome.value
            );
            match serde_json::to_value(&outcome) {
                Ok(data) => ToolResponse::success_with_message(data, message),
                Err(e) => ToolResponse::error(&HomebridgeError::from(e)),
            }
        }
        Err(e) => ToolResponse::error(&e),
    }
}

/// A generated per-characteristic tool: `{ value }` written to its target
pub async fn call_generated_tool(
    ctx: &ToolContext,
    name: &str,
    arguments: &Option<Value>,
) -> ToolResponse {
    let result: Result<_> = async {
        let generation = ctx.generated_tools().await?;
        let tool = generation
            .tools
            .iter()
            .find(|tool| tool.name == name)
            .ok_or_else(|| HomebridgeError::invalid_input(format!("Unknown tool: {name}")))?;

        let value = required_value(arguments, "value")?;
        debug!(
            "Tool {} writes {} of {}",
            name, tool.target.characteristic_type, tool.target.unique_id
        );
        ctx.writer
            .write(&tool.target.unique_id, &tool.target.characteristic_type, &value)
            .await
    }
    .await;

    ToolResponse::from_result(result)
}
