//! Characteristic writes
//!
//! Every write resolves the accessory and characteristic first, coerces the
//! caller's value to the declared format and only then issues a single `PUT`.
//! Anything that fails before the `PUT` leaves the bridge untouched, and a
//! failed `PUT` is reported as-is without retrying.

use crate::client::{Accessory, CharacteristicValue, ServiceCharacteristic};
use crate::error::{HomebridgeError, Result};
use crate::services::AccessoryDirectory;
use crate::validation::CharacteristicFormat;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One requested write, as accepted by the batch tool
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    /// Accessory `uniqueId`
    pub accessory_id: String,
    /// Characteristic type tag, e.g. `On` or `Brightness`
    pub characteristic_type: String,
    /// New value (string, number or boolean)
    #[schemars(with = "serde_json::Value")]
    pub value: CharacteristicValue,
}

/// Result of a successful write
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub accessory_id: String,
    pub characteristic_type: String,
    /// Value after coercion, exactly as sent
    pub value: CharacteristicValue,
    /// Bridge response body
    pub response: serde_json::Value,
}

/// Resolves, coerces and writes characteristic values
pub struct ValueWriter {
    directory: Arc<AccessoryDirectory>,
    use_cache: bool,
}

impl ValueWriter {
    pub fn new(directory: Arc<AccessoryDirectory>, use_cache: bool) -> Self {
        Self {
            directory,
            use_cache,
        }
    }

    /// Write one characteristic value
    pub async fn write(
        &self,
        accessory_id: &str,
        characteristic_type: &str,
        raw: &CharacteristicValue,
    ) -> Result<WriteOutcome> {
        let accessories = self.directory.fetch(self.use_cache).await?;

        let accessory = AccessoryDirectory::find_by_id(&accessories, accessory_id)
            .ok_or_else(|| HomebridgeError::not_found(format!("accessory '{accessory_id}'")))?;

        let characteristic =
            AccessoryDirectory::find_characteristic(accessory, characteristic_type).ok_or_else(
                || {
                    HomebridgeError::not_found(format!(
                        "characteristic '{characteristic_type}' on accessory '{accessory_id}'"
                    ))
                },
            )?;

        let value = prepare_value(accessory, characteristic, raw)?;
        debug!(
            "Writing {}={} to {} ({})",
            characteristic_type,
            value,
            accessory.display_name(),
            accessory_id
        );

        let response = self
            .directory
            .client()
            .set_characteristic(accessory_id, characteristic_type, &value)
            .await
            .inspect_err(|e| warn!("Write to {accessory_id}/{characteristic_type} failed: {e}"))?;

        info!("Set {characteristic_type}={value} on {}", accessory.display_name());

        Ok(WriteOutcome {
            accessory_id: accessory_id.to_string(),
            characteristic_type: characteristic_type.to_string(),
            value,
            response,
        })
    }

    /// Issue independent writes concurrently
    ///
    /// Outcomes come back in request order. One failure does not affect the
    /// other writes.
    pub async fn write_batch(&self, requests: &[WriteRequest]) -> Vec<Result<WriteOutcome>> {
        let writes = requests
            .iter()
            .map(|req| self.write(&req.accessory_id, &req.characteristic_type, &req.value));
        join_all(writes).await
    }
}

/// Coerce a raw value and check it against the characteristic's domain
fn prepare_value(
    accessory: &Accessory,
    characteristic: &ServiceCharacteristic,
    raw: &CharacteristicValue,
) -> Result<CharacteristicValue> {
    if !characteristic.can_write {
        return Err(HomebridgeError::validation(format!(
            "characteristic '{}' on '{}' is read-only",
            characteristic.characteristic_type,
            accessory.display_name()
        )));
    }

    let format: CharacteristicFormat = characteristic.format.parse()?;
    let rule = format
        .rule()?
        .with_bounds(characteristic.min_value, characteristic.max_value);

    let value = format.coerce(raw)?;
    rule.validate(&value).map_err(|e| match e {
        HomebridgeError::Validation(msg) => HomebridgeError::validation(format!(
            "{} for {}: {msg}",
            characteristic.characteristic_type,
            accessory.display_name()
        )),
        other => other,
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HomebridgeClient;
    use crate::mock::{fixtures, MockHomebridgeClient, RecordedWrite};
    use pretty_assertions::assert_eq;

    fn writer(mock: &Arc<MockHomebridgeClient>) -> ValueWriter {
        let directory = Arc::new(AccessoryDirectory::new(
            Arc::clone(mock) as Arc<dyn HomebridgeClient>
        ));
        ValueWriter::new(directory, true)
    }

    fn text(s: &str) -> CharacteristicValue {
        CharacteristicValue::String(s.to_string())
    }

    #[tokio::test]
    async fn test_write_coerces_and_writes_once() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::lamp()]));
        let outcome = writer(&mock).write("U1", "On", &text("true")).await.unwrap();

        assert_eq!(outcome.value, CharacteristicValue::Bool(true));
        assert_eq!(
            mock.writes(),
            vec![RecordedWrite {
                unique_id: "U1".into(),
                characteristic_type: "On".into(),
                value: CharacteristicValue::Bool(true),
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_accessory_makes_no_write() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::lamp()]));
        let err = writer(&mock)
            .write("missing-id", "On", &text("1"))
            .await
            .unwrap_err();

        assert!(matches!(&err, HomebridgeError::NotFound(msg) if msg.contains("missing-id")));
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_characteristic_makes_no_write() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::lamp()]));
        let err = writer(&mock).write("U1", "Hue", &text("10")).await.unwrap_err();

        assert!(matches!(&err, HomebridgeError::NotFound(msg) if msg.contains("Hue")));
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_values_make_no_write() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::track_light(
            "T1", "Track",
        )]));
        let writer = writer(&mock);

        let err = writer.write("T1", "Hue", &text("bright")).await.unwrap_err();
        assert!(matches!(err, HomebridgeError::Validation(_)));

        let err = writer.write("T1", "Brightness", &text("150")).await.unwrap_err();
        assert!(matches!(err, HomebridgeError::Validation(_)));

        let err = writer.write("T1", "Name", &text("Desk")).await.unwrap_err();
        assert!(matches!(err, HomebridgeError::Validation(_)));

        let err = writer
            .write("T1", "AdaptiveLightingControl", &text("AQID"))
            .await
            .unwrap_err();
        assert!(matches!(err, HomebridgeError::UnsupportedFormat(_)));

        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced_without_retry() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![fixtures::lamp()]));
        mock.fail_writes(true);

        let err = writer(&mock).write("U1", "On", &text("true")).await.unwrap_err();
        assert!(matches!(&err, HomebridgeError::Write(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_independence() {
        let mock = Arc::new(MockHomebridgeClient::new(vec![
            fixtures::lamp(),
            fixtures::track_light("T1", "Track"),
        ]));
        let requests = vec![
            WriteRequest {
                accessory_id: "U1".into(),
                characteristic_type: "On".into(),
                value: CharacteristicValue::Bool(false),
            },
            WriteRequest {
                accessory_id: "missing-id".into(),
                characteristic_type: "On".into(),
                value: text("1"),
            },
            WriteRequest {
                accessory_id: "T1".into(),
                characteristic_type: "Hue".into(),
                value: text("212"),
            },
        ];

        let outcomes = writer(&mock).write_batch(&requests).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes[0].as_ref().unwrap().value,
            CharacteristicValue::Bool(false)
        );
        assert!(matches!(outcomes[1], Err(HomebridgeError::NotFound(_))));
        assert_eq!(
            outcomes[2].as_ref().unwrap().value,
            CharacteristicValue::Float(212.0)
        );
        assert_eq!(mock.writes().len(), 2);
    }
}
