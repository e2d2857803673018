//! Client configuration.
//!
//! Values come from serde defaults, optionally overridden by `REMOTEFLOWS_*`
//! environment variables. Nothing here fails: bad values are logged and the
//! default is kept.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Gateway the client talks to when no proxy is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Partners,
    #[default]
    Production,
    Sandbox,
    Staging,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Local => "http://localhost:4000",
            Environment::Partners => "https://gateway.partners.remote-sandbox.com",
            Environment::Production => "https://gateway.remote.com",
            Environment::Sandbox => "https://gateway.remote-sandbox.com",
            Environment::Staging => "https://gateway.niceremote.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Partners => "partners",
            Environment::Production => "production",
            Environment::Sandbox => "sandbox",
            Environment::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "partners" => Ok(Environment::Partners),
            "production" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            "staging" => Ok(Environment::Staging),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// Base URL used when neither a proxy nor an environment is set
pub const DEFAULT_BASE_URL: &str = "https://gateway.remote.com";

/// Route requests through a host controlled proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Retry policy for GET requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Statuses that will not change on retry
pub const NON_RETRYABLE_STATUSES: [u16; 4] = [400, 401, 403, 404];

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Exponential backoff for the zero based `attempt`, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Whether a failure with `status` (None for transport errors) is worth retrying
    pub fn should_retry(&self, status: Option<u16>) -> bool {
        match status {
            Some(status) => !NON_RETRYABLE_STATUSES.contains(&status),
            None => true,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub environment: Option<Environment>,

    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sent as `X-Client-Name`
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Sent as `X-Client-Version`
    #[serde(default = "default_client_version")]
    pub client_version: String,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_client_name() -> String {
    "remoteflows-rs".to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: None,
            proxy: None,
            timeout_secs: default_timeout_secs(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by environment variables
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(environment) = env::var("REMOTEFLOWS_ENVIRONMENT") {
            match environment.parse::<Environment>() {
                Ok(environment) => config.environment = Some(environment),
                Err(_) => warn!("Invalid REMOTEFLOWS_ENVIRONMENT value: {}", environment),
            }
        }

        if let Ok(proxy_url) = env::var("REMOTEFLOWS_PROXY_URL") {
            config.proxy = Some(ProxyConfig {
                url: proxy_url,
                headers: BTreeMap::new(),
            });
        }

        if let Ok(timeout) = env::var("REMOTEFLOWS_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(timeout) if timeout > 0 => config.timeout_secs = timeout,
                _ => warn!("Invalid REMOTEFLOWS_TIMEOUT_SECS value: {}", timeout),
            }
        }

        if let Ok(retries) = env::var("REMOTEFLOWS_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(retries) => config.retry.max_retries = retries,
                Err(_) => warn!("Invalid REMOTEFLOWS_MAX_RETRIES value: {}", retries),
            }
        }

        config
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL: a valid proxy URL, else the environment's gateway, else production.
    pub fn base_url(&self) -> String {
        if let Some(proxy) = &self.proxy {
            match Url::parse(&proxy.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    debug!(url = %proxy.url, "Using proxy base URL");
                    return proxy.url.trim_end_matches('/').to_string();
                }
                _ => warn!(url = %proxy.url, "Invalid proxy URL, falling back to the gateway"),
            }
        }

        match self.environment {
            Some(environment) => environment.base_url().to_string(),
            None => DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Headers sent through the proxy, empty without one
    pub fn proxy_headers(&self) -> BTreeMap<String, String> {
        self.proxy
            .as_ref()
            .map(|p| p.headers.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn proxy(url: &str) -> ProxyConfig {
        ProxyConfig {
            url: url.to_string(),
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_base_url_precedence() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);

        let config = config.with_environment(Environment::Sandbox);
        assert_eq!(config.base_url(), "https://gateway.remote-sandbox.com");

        let config = config.with_proxy(proxy("https://proxy.example.com/remote/"));
        assert_eq!(config.base_url(), "https://proxy.example.com/remote");
    }

    #[test]
    fn test_invalid_proxy_falls_back() {
        let config = ClientConfig::default()
            .with_environment(Environment::Staging)
            .with_proxy(proxy("not a url"));
        assert_eq!(config.base_url(), "https://gateway.niceremote.com");

        let config = ClientConfig::default().with_proxy(proxy("ftp://files.example.com"));
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_retry_backoff_is_capped() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(30));
    }

    #[test]
    fn test_retryable_statuses() {
        let policy = RetryPolicy::default();

        for status in NON_RETRYABLE_STATUSES {
            assert!(!policy.should_retry(Some(status)));
        }
        assert!(policy.should_retry(Some(500)));
        assert!(policy.should_retry(Some(429)));
        assert!(policy.should_retry(None));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("Partners".parse::<Environment>(), Ok(Environment::Partners));
        assert!("moon".parse::<Environment>().is_err());

        let config: ClientConfig = serde_json::from_str(r#"{ "environment": "local" }"#).unwrap();
        assert_eq!(config.environment, Some(Environment::Local));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
