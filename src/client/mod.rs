//! Homebridge UI API client and accessory data model

pub mod http_client;

pub use http_client::HomebridgeHttpClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value held by a service characteristic
///
/// Serialized untagged so it reads and writes the bridge's plain JSON
/// values (`true`, `42`, `0.5`, `"Lamp"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl CharacteristicValue {
    /// Convert an arbitrary JSON value coming from a tool call
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// One controllable or readable property of an accessory ("On", "Hue", ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCharacteristic {
    #[serde(default)]
    pub aid: u64,
    #[serde(default)]
    pub iid: u64,
    #[serde(default)]
    pub uuid: String,
    /// Type tag, unique within the owning accessory
    #[serde(rename = "type")]
    pub characteristic_type: String,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value: Option<CharacteristicValue>,
    /// Declared primitive format (`bool`, `uint8`, `float`, `tlv8`, ...)
    pub format: String,
    #[serde(default)]
    pub perms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_step: Option<f64>,
    #[serde(default)]
    pub ev: bool,
}

/// Manufacturer block reported by the accessory information service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessoryInformation {
    #[serde(rename = "Manufacturer", default)]
    pub manufacturer: String,
    #[serde(rename = "Model", default)]
    pub model: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Serial Number", default)]
    pub serial_number: String,
    #[serde(rename = "Firmware Revision", default)]
    pub firmware_revision: String,
}

/// Bridge instance that published the accessory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryInstance {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub connection_failed_count: u32,
    #[serde(default)]
    pub configuration_number: u32,
}

/// One physical or logical device exposed by the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    #[serde(default)]
    pub aid: u64,
    #[serde(default)]
    pub iid: u64,
    #[serde(default)]
    pub uuid: String,
    #[serde(rename = "type", default)]
    pub accessory_type: String,
    #[serde(default)]
    pub human_type: String,
    /// Display name
    pub service_name: String,
    #[serde(default)]
    pub service_characteristics: Vec<ServiceCharacteristic>,
    #[serde(default)]
    pub accessory_information: AccessoryInformation,
    #[serde(default)]
    pub values: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<AccessoryInstance>,
    pub unique_id: String,
}

impl Accessory {
    /// Display name, falling back to the information block
    pub fn display_name(&self) -> &str {
        if self.service_name.is_empty() {
            &self.accessory_information.name
        } else {
            &self.service_name
        }
    }
}

/// Token returned by `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Remote bridge operations
#[async_trait]
pub trait HomebridgeClient: Send + Sync {
    /// `GET /api/accessories`
    async fn get_accessories(&self) -> Result<Vec<Accessory>>;

    /// `PUT /api/accessories/{unique_id}` with the coerced value
    async fn set_characteristic(
        &self,
        unique_id: &str,
        characteristic_type: &str,
        value: &CharacteristicValue,
    ) -> Result<serde_json::Value>;

    /// Check that the bridge answers with valid credentials
    async fn health_check(&self) -> Result<bool> {
        match self.get_accessories().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_auth_error() => Err(e),
            Err(_) => Ok(false),
        }
    }
}
