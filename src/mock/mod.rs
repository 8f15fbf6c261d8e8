//! Mock implementations for testing
//!
//! [`MockHomebridgeClient`] serves a fixed accessory list and records every
//! fetch and write, so tests can assert how many network calls were made.

use crate::client::{Accessory, CharacteristicValue, HomebridgeClient};
use crate::error::{HomebridgeError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A write recorded by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub unique_id: String,
    pub characteristic_type: String,
    pub value: CharacteristicValue,
}

/// Mock Homebridge client for testing
pub struct MockHomebridgeClient {
    accessories: Mutex<Vec<Accessory>>,
    fetch_count: AtomicUsize,
    writes: Mutex<Vec<RecordedWrite>>,
    fail_fetch: AtomicBool,
    fail_write: AtomicBool,
}

impl MockHomebridgeClient {
    /// Create new mock client serving the given accessories
    pub fn new(accessories: Vec<Accessory>) -> Self {
        Self {
            accessories: Mutex::new(accessories),
            fetch_count: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_write: AtomicBool::new(false),
        }
    }

    /// Replace the accessories served by later fetches
    pub fn set_accessories(&self, accessories: Vec<Accessory>) {
        *self.accessories.lock().unwrap() = accessories;
    }

    /// Make every later fetch fail
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make every later write fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::SeqCst);
    }

    /// Number of accessory list retrievals so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Writes issued so far, in order
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }
}

impl Default for MockHomebridgeClient {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl HomebridgeClient for MockHomebridgeClient {
    async fn get_accessories(&self) -> Result<Vec<Accessory>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(HomebridgeError::fetch("HTTP error 503: mock bridge unavailable"));
        }
        Ok(self.accessories.lock().unwrap().clone())
    }

    async fn set_characteristic(
        &self,
        unique_id: &str,
        characteristic_type: &str,
        value: &CharacteristicValue,
    ) -> Result<serde_json::Value> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(HomebridgeError::write("HTTP error 500: mock write rejected"));
        }
        self.writes.lock().unwrap().push(RecordedWrite {
            unique_id: unique_id.to_string(),
            characteristic_type: characteristic_type.to_string(),
            value: value.clone(),
        });
        Ok(json!({
            "uniqueId": unique_id,
            "values": { characteristic_type: value },
        }))
    }
}

/// Test fixtures shared by unit tests
pub mod fixtures {
    use crate::client::Accessory;
    use serde_json::json;

    /// The "Lamp" accessory (`U1`) with a single writable `On` characteristic
    pub fn lamp() -> Accessory {
        serde_json::from_value(json!({
            "aid": 2,
            "iid": 1,
            "uuid": "00000043-0000-1000-8000-0026BB765291",
            "type": "Lightbulb",
            "humanType": "Lightbulb",
            "serviceName": "Lamp",
            "serviceCharacteristics": [{
                "aid": 2,
                "iid": 9,
                "type": "On",
                "serviceType": "Lightbulb",
                "serviceName": "Lamp",
                "description": "On",
                "value": false,
                "format": "bool",
                "perms": ["ev", "pr", "pw"],
                "canRead": true,
                "canWrite": true,
                "ev": true
            }],
            "accessoryInformation": {
                "Manufacturer": "Acme",
                "Model": "L1",
                "Name": "Lamp",
                "Serial Number": "0001",
                "Firmware Revision": "1.0.0"
            },
            "values": { "On": false },
            "uniqueId": "U1"
        }))
        .expect("lamp fixture is valid")
    }

    /// A colour light with hue, brightness, a read-only name and a TLV8 blob
    pub fn track_light(unique_id: &str, name: &str) -> Accessory {
        serde_json::from_value(json!({
            "aid": 3,
            "iid": 1,
            "type": "Lightbulb",
            "humanType": "Lightbulb",
            "serviceName": name,
            "serviceCharacteristics": [
                {
                    "type": "On", "description": "On", "format": "bool",
                    "value": 1, "canRead": true, "canWrite": true
                },
                {
                    "type": "Hue", "description": "Hue", "format": "float",
                    "value": 0, "unit": "arcdegrees", "minValue": 0, "maxValue": 360,
                    "minStep": 1, "canRead": true, "canWrite": true
                },
                {
                    "type": "Brightness", "description": "Brightness", "format": "int",
                    "value": 100, "unit": "percentage", "minValue": 0, "maxValue": 100,
                    "canRead": true, "canWrite": true
                },
                {
                    "type": "Name", "description": "Name", "format": "string",
                    "value": name, "canRead": true, "canWrite": false
                },
                {
                    "type": "AdaptiveLightingControl", "description": "Adaptive Lighting",
                    "format": "tlv8", "value": "AQID", "canRead": true, "canWrite": true
                }
            ],
            "uniqueId": unique_id
        }))
        .expect("track light fixture is valid")
    }
}
