//! HTTP client for the Remote gateway.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::auth::{CredentialProvider, SessionCache};
use crate::config::ClientConfig;
use crate::error::ClientError;

pub const CLIENT_NAME_HEADER: &str = "X-Client-Name";
pub const CLIENT_VERSION_HEADER: &str = "X-Client-Version";

/// Authenticated client, one session cache per instance
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    config: ClientConfig,
    sessions: SessionCache,
}

/// Build a client; without credentials requests go out unauthenticated.
pub fn create_client(
    credentials: Option<Arc<dyn CredentialProvider>>,
    config: ClientConfig,
) -> Result<ApiClient, ClientError> {
    ApiClient::new(credentials, config)
}

impl ApiClient {
    pub fn new(
        credentials: Option<Arc<dyn CredentialProvider>>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers(&config))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let base_url = config.base_url();
        debug!(base_url = %base_url, authenticated = credentials.is_some(), "Created API client");

        Ok(Self {
            http,
            base_url,
            config,
            sessions: SessionCache::new(credentials),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    /// GET with retries for transient failures
    #[instrument(skip(self, query), fields(base_url = %self.base_url))]
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ClientError> {
        let policy = &self.config.retry;
        let mut attempt = 0;
        loop {
            match self.send(Method::GET, path, query, None).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < policy.max_retries && policy.should_retry(error.status()) => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        path,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    /// One attempt; non-success statuses become [`ClientError::Status`]
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = self.sessions.access_token().await {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(method = %method, path, status = status.as_u16(), "Gateway responded");
        if status.is_success() {
            Ok(value)
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                body: value,
            })
        }
    }
}

fn default_headers(config: &ClientConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        (CLIENT_NAME_HEADER.to_string(), config.client_name.clone()),
        (CLIENT_VERSION_HEADER.to_string(), config.client_version.clone()),
    ];

    for (name, value) in pairs.into_iter().chain(config.proxy_headers()) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid header"),
        }
    }
    headers
}
