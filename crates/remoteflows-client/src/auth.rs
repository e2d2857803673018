//! Access tokens and the per-client session cache.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::AuthError;

/// Tokens are refreshed this long before they expire
pub const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// Token as returned by a credential provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Source of access tokens, usually a host endpoint that exchanges
/// client credentials server side.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<AccessToken, AuthError>;
}

/// Adapter for async closures
pub struct FnCredentials<F>(F);

#[async_trait]
impl<F, Fut> CredentialProvider for FnCredentials<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<AccessToken, AuthError>> + Send,
{
    async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        (self.0)().await
    }
}

/// Wrap an async closure as a credential provider
pub fn credentials_fn<F, Fut>(fetch: F) -> Arc<dyn CredentialProvider>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AccessToken, AuthError>> + Send + 'static,
{
    Arc::new(FnCredentials(fetch))
}

/// A cached token
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub expires_at: Instant,
}

impl Session {
    pub fn from_token(token: AccessToken, now: Instant) -> Self {
        Self {
            expires_at: now + Duration::from_secs(token.expires_in),
            access_token: token.access_token,
        }
    }

    /// Usable at `now` with the refresh skew applied
    pub fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_SKEW < self.expires_at
    }
}

/// Session cache owned by one client.
///
/// Concurrent refreshes are not deduplicated; the last token stored wins.
pub struct SessionCache {
    provider: Option<Arc<dyn CredentialProvider>>,
    session: Mutex<Option<Session>>,
}

impl SessionCache {
    pub fn new(provider: Option<Arc<dyn CredentialProvider>>) -> Self {
        Self {
            provider,
            session: Mutex::new(None),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// A fresh token, fetching one if needed; None when unauthenticated.
    pub async fn access_token(&self) -> Option<String> {
        let provider = self.provider.as_ref()?;
        if let Some(token) = self.cached(Instant::now()) {
            return Some(token);
        }

        match provider.fetch_token().await {
            Ok(token) if token.access_token.is_empty() => {
                warn!("Credential provider returned an empty token, continuing unauthenticated");
                None
            }
            Ok(token) => {
                let session = Session::from_token(token, Instant::now());
                debug!(expires_in = ?session.expires_at.saturating_duration_since(Instant::now()), "Stored new session");
                let access_token = session.access_token.clone();
                *self.session.lock() = Some(session);
                Some(access_token)
            }
            Err(error) => {
                warn!(error = %error, "Could not fetch access token, continuing unauthenticated");
                None
            }
        }
    }

    fn cached(&self, now: Instant) -> Option<String> {
        self.session
            .lock()
            .as_ref()
            .filter(|session| session.is_fresh(now))
            .map(|session| session.access_token.clone())
    }

    /// Drop the cached session
    pub fn clear(&self) {
        *self.session.lock() = None;
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("has_provider", &self.has_provider())
            .finish_non_exhaustive()
    }
}
