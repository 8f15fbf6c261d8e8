//! HTTP client implementation for the Homebridge UI REST API
//!
//! Talks to `homebridge-config-ui-x` with a bearer token. When no token is
//! configured but a username and password are, the client logs in via
//! `POST /api/auth/login` and reuses the returned token until the bridge
//! answers 401, then logs in again and retries the request once.

use crate::client::{Accessory, CharacteristicValue, HomebridgeClient, LoginResponse};
use crate::config::{HomebridgeConfig, HomebridgeCredentials};
use crate::error::{HomebridgeError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Which kind of request failed, used to pick the error variant
#[derive(Debug, Clone, Copy)]
enum RequestKind {
    Fetch,
    Write,
    Login,
}

/// HTTP client for a Homebridge instance
pub struct HomebridgeHttpClient {
    /// HTTP client instance
    client: Client,

    /// Base URL of the Homebridge UI, always ending in `/`
    base_url: Url,

    /// Configured credentials
    credentials: HomebridgeCredentials,

    /// Bearer token in use (configured or obtained by login)
    token: RwLock<Option<String>>,
}

impl HomebridgeHttpClient {
    /// Create a new HTTP client
    pub fn new(config: &HomebridgeConfig, credentials: HomebridgeCredentials) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(format!("homebridge-mcp/{}", env!("CARGO_PKG_VERSION")));

        if !config.verify_ssl {
            warn!("SSL verification disabled - this is insecure for production use");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| HomebridgeError::connection(format!("Failed to build HTTP client: {e}")))?;

        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let token = credentials.token.clone();

        Ok(Self {
            client,
            base_url,
            credentials,
            token: RwLock::new(token),
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build URL for API endpoint
    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| HomebridgeError::config(format!("Invalid URL path {path}: {e}")))
    }

    /// Whether the token in use was obtained by login and can be renewed
    fn can_login(&self) -> bool {
        self.credentials.token.is_none()
            && self.credentials.username.is_some()
            && self.credentials.password.is_some()
    }

    /// Forget `stale` so the next request logs in again
    async fn invalidate_token(&self, stale: &str) {
        let mut guard = self.token.write().await;
        if guard.as_deref() == Some(stale) {
            *guard = None;
        }
    }

    /// Send an authorized request, renewing a login token once on 401
    async fn send_authorized<F>(&self, kind: RequestKind, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.bearer_token().await?;
        let response = build(&token)
            .send()
            .await
            .map_err(|e| Self::transport_error(kind, e))?;

        if response.status() != StatusCode::UNAUTHORIZED || !self.can_login() {
            return Self::check_status(kind, response).await;
        }

        warn!("Homebridge rejected the session token, logging in again");
        self.invalidate_token(&token).await;
        let token = self.bearer_token().await?;
        let response = build(&token)
            .send()
            .await
            .map_err(|e| Self::transport_error(kind, e))?;
        Self::check_status(kind, response).await
    }

    /// Return the bearer token, logging in first if only credentials are known
    async fn bearer_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let (Some(username), Some(password)) =
            (&self.credentials.username, &self.credentials.password)
        else {
            return Err(HomebridgeError::authentication(
                "No bearer token configured and no username/password to obtain one",
            ));
        };

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let token = self.login(username, password).await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// `POST /api/auth/login`
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = self.build_url("api/auth/login")?;
        info!("Logging in to Homebridge at {} as {}", self.base_url, username);

        let response = self
            .client
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|e| Self::transport_error(RequestKind::Login, e))?;

        let response = Self::check_status(RequestKind::Login, response).await?;
        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| HomebridgeError::authentication(format!("Invalid login response: {e}")))?;

        debug!(
            "Obtained {} token (expires in {:?}s)",
            login.token_type.as_deref().unwrap_or("bearer"),
            login.expires_in
        );
        Ok(login.access_token)
    }

    fn transport_error(kind: RequestKind, e: reqwest::Error) -> HomebridgeError {
        if e.is_timeout() && !matches!(kind, RequestKind::Login) {
            return HomebridgeError::timeout(format!("{kind:?} request: {e}"));
        }

        let msg = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            format!("request failed: {e}")
        };

        match kind {
            RequestKind::Fetch => HomebridgeError::fetch(msg),
            RequestKind::Write => HomebridgeError::write(msg),
            RequestKind::Login => HomebridgeError::authentication(msg),
        }
    }

    /// Map non-success status codes to errors, keeping the response body text
    async fn check_status(kind: RequestKind, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            debug!("HTTP request successful: {}", status);
            return Ok(response);
        }

        let response_text = response.text().await.unwrap_or_default();
        let error_msg = format!("HTTP error {status}: {response_text}");

        Err(match (status, kind) {
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) | (_, RequestKind::Login) => {
                HomebridgeError::authentication(error_msg)
            }
            (_, RequestKind::Fetch) => HomebridgeError::fetch(error_msg),
            (_, RequestKind::Write) => HomebridgeError::write(error_msg),
        })
    }
}

#[async_trait]
impl HomebridgeClient for HomebridgeHttpClient {
    async fn get_accessories(&self) -> Result<Vec<Accessory>> {
        let url = self.build_url("api/accessories")?;
        debug!("Fetching accessory list from {url}");

        let response = self
            .send_authorized(RequestKind::Fetch, |token| {
                self.client.get(url.clone()).bearer_auth(token)
            })
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| Self::transport_error(RequestKind::Fetch, e))?;

        let accessories: Vec<Accessory> = serde_json::from_str(&text)
            .map_err(|e| HomebridgeError::fetch(format!("Invalid accessory list: {e}")))?;

        debug!("Fetched {} accessories", accessories.len());
        Ok(accessories)
    }

    async fn set_characteristic(
        &self,
        unique_id: &str,
        characteristic_type: &str,
        value: &CharacteristicValue,
    ) -> Result<serde_json::Value> {
        let mut url = self.build_url("api/accessories")?;
        url.path_segments_mut()
            .map_err(|_| HomebridgeError::config("Homebridge URL cannot be a base"))?
            .push(unique_id);

        debug!("Setting {characteristic_type}={value} on accessory {unique_id}");

        let body = json!({
            "characteristicType": characteristic_type,
            "value": value,
        });
        let response = self
            .send_authorized(RequestKind::Write, |token| {
                self.client.put(url.clone()).bearer_auth(token).json(&body)
            })
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| Self::transport_error(RequestKind::Write, e))?;

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}
