// RemoteFlows E2E Tests
//
// Flows running on top of `ApiClient`, with only the gateway mocked.

/// Shared setup for the end-to-end tests
pub mod utils {
    use remoteflows_client::{
        create_client, credentials_fn, AccessToken, ApiClient, ClientConfig, ProxyConfig,
        RetryPolicy,
    };
    use remoteflows_core::FlowContext;
    use remoteflows_monitoring::MemoryErrorReporter;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use wiremock::MockServer;

    /// Token handed out by the credentials of [`client_for`]
    pub const TEST_TOKEN: &str = "e2e-token";

    /// Client pointed at the mock gateway, without retries
    pub fn client_for(server: &MockServer) -> ApiClient {
        let credentials = credentials_fn(|| async {
            Ok(AccessToken {
                access_token: TEST_TOKEN.to_string(),
                expires_in: 3600,
            })
        });
        let config = ClientConfig::default()
            .with_proxy(ProxyConfig {
                url: server.uri(),
                headers: BTreeMap::new(),
            })
            .with_retry(RetryPolicy::none());

        create_client(Some(credentials), config)
            .unwrap_or_else(|e| panic!("Failed to create client: {}", e))
    }

    /// Flow context over a real client, reporting into memory
    pub fn context_for(server: &MockServer) -> (FlowContext, Arc<MemoryErrorReporter>) {
        let reporter = Arc::new(MemoryErrorReporter::new());
        let ctx = FlowContext::new(Arc::new(client_for(server))).with_reporter(reporter.clone());
        (ctx, reporter)
    }
}
