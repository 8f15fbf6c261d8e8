//! Batch characteristic writes
//!
//! Writes in a batch run concurrently and independently: each one is resolved,
//! coerced and sent on its own, and reports its own outcome. There is no
//! rollback and no ordering between writes.

use crate::error::HomebridgeError;
use crate::tools::{SetCharacteristicsBatchParams, ToolContext, ToolResponse};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// `set_characteristics_batch`
pub async fn set_characteristics_batch(
    ctx: &ToolContext,
    arguments: &Option<Value>,
) -> ToolResponse {
    let params: SetCharacteristicsBatchParams = match arguments
        .clone()
        .map(serde_json::from_value)
        .transpose()
    {
        Ok(Some(params)) => params,
        Ok(None) => {
            return ToolResponse::error(&HomebridgeError::invalid_input(
                "Missing required parameter: writes",
            ))
        }
        Err(e) => {
            return ToolResponse::error(&HomebridgeError::invalid_input(format!(
                "Invalid batch request: {e}"
            )))
        }
    };

    if params.writes.is_empty() {
        return ToolResponse::error(&HomebridgeError::invalid_input(
            "Batch must contain at least one write",
        ));
    }

    debug!("Executing batch of {} writes", params.writes.len());
    let outcomes = ctx.writer.write_batch(&params.writes).await;

    let results: Vec<Value> = params
        .writes
        .iter()
        .zip(outcomes)
        .map(|(request, outcome)| match outcome {
            Ok(outcome) => json!({
                "accessoryId": outcome.accessory_id,
                "characteristicType": outcome.characteristic_type,
                "status": "success",
                "value": outcome.value,
            }),
            Err(e) => {
                warn!(
                    "Batch write {}/{} failed: {e}",
                    request.accessory_id, request.characteristic_type
                );
                json!({
                    "accessoryId": request.accessory_id,
                    "characteristicType": request.characteristic_type,
                    "status": "error",
                    "error": e.to_json(),
                })
            }
        })
        .collect();

    let succeeded = results
        .iter()
        .filter(|r| r["status"] == "success")
        .count();
    let failed = results.len() - succeeded;

    ToolResponse::success_with_message(
        json!({
            "total": results.len(),
            "succeeded": succeeded,
            "failed": failed,
            "results": results,
        }),
        format!("{succeeded} of {} writes succeeded", results.len()),
    )
}
