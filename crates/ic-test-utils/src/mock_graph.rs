//! Wiremock stand-in for the identity provider and the calendaring/mail API.
//!
//! One `MockServer` serves both: the token endpoint lives at the root, the
//! API under `/v1.0`. Mount helpers take an expected call count so each test
//! states which downstream calls must (and must not) happen; wiremock
//! verifies the counts when the server is dropped.

use ic_service::config::Config;
use serde_json::{json, Value};
use std::collections::HashMap;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TEST_TENANT_ID: &str = "test-tenant";
pub const TEST_CLIENT_ID: &str = "test-client";
pub const TEST_CLIENT_SECRET: &str = "test-secret";
pub const TEST_ORGANIZER_UPN: &str = "incident-bot@contoso.com";
pub const TEST_ACCESS_TOKEN: &str = "test-graph-token";

pub const TOKEN_PATH: &str = "/test-tenant/oauth2/v2.0/token";
pub const MEETINGS_PATH: &str = "/v1.0/users/incident-bot%40contoso.com/onlineMeetings";
pub const SEND_MAIL_PATH: &str = "/v1.0/users/incident-bot%40contoso.com/sendMail";

/// Join URL returned by [`MockGraph::meeting`].
pub const TEST_JOIN_URL: &str = "https://teams.example.com/l/meetup-join/abc";

pub struct MockGraph {
    server: MockServer,
}

impl MockGraph {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn identity_base_url(&self) -> String {
        self.server.uri()
    }

    pub fn graph_base_url(&self) -> String {
        format!("{}/v1.0", self.server.uri())
    }

    /// Environment for a service pointed at this mock.
    pub fn config_vars(&self) -> HashMap<String, String> {
        HashMap::from([
            ("AZ_TENANT_ID".to_string(), TEST_TENANT_ID.to_string()),
            ("AZ_CLIENT_ID".to_string(), TEST_CLIENT_ID.to_string()),
            (
                "AZ_CLIENT_SECRET".to_string(),
                TEST_CLIENT_SECRET.to_string(),
            ),
            ("ORGANIZER_UPN".to_string(), TEST_ORGANIZER_UPN.to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("IDENTITY_BASE_URL".to_string(), self.identity_base_url()),
            ("GRAPH_BASE_URL".to_string(), self.graph_base_url()),
            ("HTTP_TIMEOUT_SECONDS".to_string(), "5".to_string()),
        ])
    }

    pub fn config(&self) -> Config {
        Config::from_vars(&self.config_vars()).expect("mock config should load")
    }

    /// Meeting representation with a top-level `joinUrl`.
    pub fn meeting(id: &str) -> Value {
        json!({
            "id": id,
            "subject": "incident",
            "joinUrl": TEST_JOIN_URL
        })
    }

    pub async fn mount_token_success(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TEST_ACCESS_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_token_failure(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_meeting_created(&self, meeting: Value, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(MEETINGS_PATH))
            .and(header(
                "Authorization",
                format!("Bearer {TEST_ACCESS_TOKEN}").as_str(),
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(meeting))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_meeting_failure(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(MEETINGS_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_send_mail_success(&self, send_mail_path: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(send_mail_path))
            .and(header(
                "Authorization",
                format!("Bearer {TEST_ACCESS_TOKEN}").as_str(),
            ))
            .respond_with(ResponseTemplate::new(202))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_send_mail_failure(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(SEND_MAIL_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Assert a POST to `endpoint_path` never happens.
    pub async fn forbid_post(&self, endpoint_path: &str) {
        Mock::given(method("POST"))
            .and(path(endpoint_path))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Assert no DELETE (rollback) is ever issued.
    pub async fn forbid_deletes(&self) {
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Requests received for `endpoint_path`, in arrival order.
    pub async fn requests_to(&self, endpoint_path: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == endpoint_path)
            .collect()
    }
}
