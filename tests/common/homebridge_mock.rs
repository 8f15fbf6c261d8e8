//! WireMock-based Homebridge UI API mocking
//!
//! Simulates the `homebridge-config-ui-x` REST endpoints used by the server.

#![allow(dead_code)]

use homebridge_mcp::client::HomebridgeHttpClient;
use homebridge_mcp::config::{HomebridgeConfig, HomebridgeCredentials};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_TOKEN: &str = "test-token";

/// Mock Homebridge UI server
pub struct MockHomebridge {
    pub server: MockServer,
}

impl MockHomebridge {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> HomebridgeConfig {
        HomebridgeConfig {
            url: self.uri().parse().expect("mock server URI is valid"),
            timeout: Duration::from_secs(5),
            verify_ssl: true,
            cache_accessories: true,
        }
    }

    /// HTTP client authenticating with [`TEST_TOKEN`]
    pub fn client(&self) -> HomebridgeHttpClient {
        self.client_with(HomebridgeCredentials {
            token: Some(TEST_TOKEN.to_string()),
            ..Default::default()
        })
    }

    pub fn client_with(&self, credentials: HomebridgeCredentials) -> HomebridgeHttpClient {
        HomebridgeHttpClient::new(&self.config(), credentials).expect("client builds")
    }

    /// `GET /api/accessories` answering with `accessories`, expected `times` times
    pub async fn mock_accessories(&self, accessories: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path("/api/accessories"))
            .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(accessories))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// `GET /api/accessories` failing with `status`
    pub async fn mock_accessories_error(&self, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/api/accessories"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// `PUT /api/accessories/{unique_id}` expecting exactly `body`
    pub async fn mock_write(&self, unique_id: &str, body: Value, times: u64) {
        Mock::given(method("PUT"))
            .and(path(format!("/api/accessories/{unique_id}")))
            .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .and(body_json(body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uniqueId": unique_id,
                "serviceName": "Lamp"
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Any `PUT` to `unique_id` failing with `status`
    pub async fn mock_write_error(&self, unique_id: &str, status: u16, body: &str) {
        Mock::given(method("PUT"))
            .and(path(format!("/api/accessories/{unique_id}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// `POST /api/auth/login` exchanging credentials for [`TEST_TOKEN`]
    pub async fn mock_login(&self, username: &str, password: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "username": username, "password": password })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "access_token": TEST_TOKEN,
                "token_type": "Bearer",
                "expires_in": 28800
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Number of requests with the given method received so far
    pub async fn request_count(&self, http_method: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method)
            .count()
    }
}

/// Accessory list as returned by `GET /api/accessories`
pub fn accessory_list() -> Value {
    json!([
        {
            "aid": 2,
            "iid": 1,
            "uuid": "00000043-0000-1000-8000-0026BB765291",
            "type": "Lightbulb",
            "humanType": "Lightbulb",
            "serviceName": "Lamp",
            "serviceCharacteristics": [
                {
                    "aid": 2, "iid": 9, "uuid": "00000025-0000-1000-8000-0026BB765291",
                    "type": "On", "serviceType": "Lightbulb", "serviceName": "Lamp",
                    "description": "On", "value": 0, "format": "bool",
                    "perms": ["ev", "pr", "pw"], "canRead": true, "canWrite": true, "ev": true
                },
                {
                    "aid": 2, "iid": 10, "uuid": "00000013-0000-1000-8000-0026BB765291",
                    "type": "Hue", "serviceType": "Lightbulb", "serviceName": "Lamp",
                    "description": "Hue", "value": 0, "format": "float", "unit": "arcdegrees",
                    "perms": ["ev", "pr", "pw"], "canRead": true, "canWrite": true, "ev": true,
                    "minValue": 0, "maxValue": 360, "minStep": 1
                },
                {
                    "aid": 2, "iid": 11, "uuid": "000000CE-0000-1000-8000-0026BB765291",
                    "type": "ColorTemperature", "serviceType": "Lightbulb", "serviceName": "Lamp",
                    "description": "Color Temperature", "value": 140, "format": "uint32",
                    "perms": ["ev", "pr", "pw"], "canRead": true, "canWrite": true, "ev": true,
                    "minValue": 140, "maxValue": 500, "minStep": 1
                },
                {
                    "aid": 2, "iid": 12, "uuid": "00000144-0000-1000-8000-0026BB765291",
                    "type": "CharacteristicValueTransitionControl", "serviceType": "Lightbulb",
                    "serviceName": "Lamp", "description": "Characteristic Value Transition Control",
                    "value": "", "format": "tlv8",
                    "perms": ["pr", "pw", "wr"], "canRead": true, "canWrite": true, "ev": false
                }
            ],
            "accessoryInformation": {
                "Manufacturer": "Acme",
                "Model": "L1",
                "Name": "Lamp",
                "Serial Number": "0001",
                "Firmware Revision": "1.0.0"
            },
            "values": { "On": 0, "Hue": 0, "ColorTemperature": 140 },
            "instance": {
                "name": "Homebridge 1A2B",
                "username": "0E:7A:3C:4D:5E:6F",
                "ipAddress": "192.168.1.20",
                "port": 51826,
                "services": [],
                "connectionFailedCount": 0
            },
            "uniqueId": "U1"
        },
        {
            "aid": 3,
            "iid": 1,
            "type": "TemperatureSensor",
            "humanType": "Temperature Sensor",
            "serviceName": "Hallway",
            "serviceCharacteristics": [
                {
                    "aid": 3, "iid": 9, "type": "CurrentTemperature",
                    "serviceType": "TemperatureSensor", "serviceName": "Hallway",
                    "description": "Current Temperature", "value": 21.5, "format": "float",
                    "unit": "celsius", "perms": ["ev", "pr"], "canRead": true, "canWrite": false,
                    "minValue": -270, "maxValue": 100, "minStep": 0.1
                }
            ],
            "accessoryInformation": {
                "Manufacturer": "Acme",
                "Model": "T1",
                "Name": "Hallway",
                "Serial Number": "0002",
                "Firmware Revision": "1.0.0"
            },
            "values": { "CurrentTemperature": 21.5 },
            "uniqueId": "S1"
        }
    ])
}
