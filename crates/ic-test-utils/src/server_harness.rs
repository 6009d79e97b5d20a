//! Test server harness for E2E testing
//!
//! Provides `TestIcServer` for spawning real incident call server instances
//! in tests.

use ic_service::config::Config;
use ic_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the incident call service in E2E tests.
pub struct TestIcServer {
    addr: SocketAddr,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestIcServer {
    /// Spawn a new test server instance.
    ///
    /// The server binds to a random available port (127.0.0.1:0) and runs
    /// the real route builder in the background.
    pub async fn spawn(config: Config) -> Result<Self, anyhow::Error> {
        let state = Arc::new(
            AppState::new(&config)
                .map_err(|e| anyhow::anyhow!("Failed to build app state: {}", e))?,
        );

        let app = routes::build_routes(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// POST a JSON body to the incident call endpoint.
    pub async fn post_incident(
        &self,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}/api/incident-call", self.url()))
            .json(&body)
            .send()
            .await?)
    }

    /// POST a raw body to the incident call endpoint.
    pub async fn post_incident_raw(
        &self,
        body: &'static str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}/api/incident-call", self.url()))
            .body(body)
            .send()
            .await?)
    }
}

impl Drop for TestIcServer {
    fn drop(&mut self) {
        // Abort the HTTP server task so the port is released when the test ends.
        self._handle.abort();
    }
}
