//! Incident call integration tests.
//!
//! Drives `POST /api/incident-call` against a real server whose identity
//! provider and calendaring/mail API are wiremock stand-ins. Every test
//! states which downstream calls are expected; wiremock verifies the counts
//! when `MockGraph` is dropped.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use chrono::{DateTime, Duration, Utc};
use ic_test_utils::{
    MockGraph, TestIcServer, MEETINGS_PATH, SEND_MAIL_PATH, TEST_JOIN_URL, TOKEN_PATH,
};
use serde_json::{json, Value};

fn parse_timestamp(value: &Value) -> DateTime<Utc> {
    let text = value.as_str().expect("timestamp should be a string");
    assert!(text.ends_with('Z'), "expected UTC timestamp, got {text}");
    DateTime::parse_from_rfc3339(text)
        .expect("timestamp should be RFC 3339")
        .with_timezone(&Utc)
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_incident_call_creates_meeting_and_notifies() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(1).await;
    graph
        .mount_meeting_created(MockGraph::meeting("meeting-123"), 1)
        .await;
    graph.mount_send_mail_success(SEND_MAIL_PATH, 1).await;
    graph.forbid_deletes().await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let before = Utc::now();

    let response = server
        .post_incident(json!({
            "priority": "P2",
            "subject": "DB down",
            "participants": ["a@x.com", "b@x.com"],
            "startInMinutes": 0,
            "durationMinutes": 15
        }))
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["meetingId"], "meeting-123");
    assert_eq!(body["joinUrl"], TEST_JOIN_URL);

    // Meeting window: starts now, lasts exactly the requested duration.
    let meeting_requests = graph.requests_to(MEETINGS_PATH).await;
    assert_eq!(meeting_requests.len(), 1);
    let meeting: Value = meeting_requests[0].body_json()?;
    assert_eq!(meeting["subject"], "DB down");
    let start = parse_timestamp(&meeting["startDateTime"]);
    let end = parse_timestamp(&meeting["endDateTime"]);
    assert!(start >= before - Duration::seconds(1));
    assert!(start <= Utc::now());
    assert_eq!(end - start, Duration::minutes(15));

    // Notification: one message, every participant a recipient.
    let mail_requests = graph.requests_to(SEND_MAIL_PATH).await;
    assert_eq!(mail_requests.len(), 1);
    let mail: Value = mail_requests[0].body_json()?;
    assert_eq!(mail["saveToSentItems"], true);
    assert_eq!(mail["message"]["subject"], "[P2] DB down - Teams meeting");
    assert_eq!(mail["message"]["body"]["contentType"], "HTML");
    let html = mail["message"]["body"]["content"].as_str().unwrap();
    assert!(html.contains(TEST_JOIN_URL));
    assert!(html.contains("<b>P2</b>"));
    let recipients: Vec<&str> = mail["message"]["toRecipients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["emailAddress"]["address"].as_str().unwrap())
        .collect();
    assert_eq!(recipients, vec!["a@x.com", "b@x.com"]);

    Ok(())
}

#[tokio::test]
async fn test_incident_call_applies_defaults() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(1).await;
    graph
        .mount_meeting_created(MockGraph::meeting("meeting-defaults"), 1)
        .await;
    graph.mount_send_mail_success(SEND_MAIL_PATH, 1).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let before = Utc::now();

    let response = server
        .post_incident(json!({ "participants": ["oncall@x.com"] }))
        .await?;

    assert_eq!(response.status(), 200);

    let meeting: Value = graph.requests_to(MEETINGS_PATH).await[0].body_json()?;
    let subject = meeting["subject"].as_str().unwrap();
    assert!(subject.starts_with("P1 Incident - "), "got {subject}");
    assert!(subject.ends_with('Z'));

    let start = parse_timestamp(&meeting["startDateTime"]);
    let end = parse_timestamp(&meeting["endDateTime"]);
    assert!(start >= before + Duration::seconds(59));
    assert_eq!(end - start, Duration::minutes(30));

    let mail: Value = graph.requests_to(SEND_MAIL_PATH).await[0].body_json()?;
    let mail_subject = mail["message"]["subject"].as_str().unwrap();
    assert!(mail_subject.starts_with("[P1] P1 Incident - "));
    assert!(mail_subject.ends_with(" - Teams meeting"));

    Ok(())
}

#[tokio::test]
async fn test_incident_call_uses_nested_join_url() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(1).await;
    graph
        .mount_meeting_created(
            json!({
                "id": "meeting-nested",
                "joinInformation": {
                    "joinUrl": "https://teams.example.com/l/nested",
                    "contentType": "html"
                }
            }),
            1,
        )
        .await;
    graph.mount_send_mail_success(SEND_MAIL_PATH, 1).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server
        .post_incident(json!({ "participants": ["a@x.com"] }))
        .await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["meetingId"], "meeting-nested");
    assert_eq!(body["joinUrl"], "https://teams.example.com/l/nested");

    let mail: Value = graph.requests_to(SEND_MAIL_PATH).await[0].body_json()?;
    let html = mail["message"]["body"]["content"].as_str().unwrap();
    assert!(html.contains("https://teams.example.com/l/nested"));

    Ok(())
}

#[tokio::test]
async fn test_incident_call_sends_from_configured_mailbox() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    let sender_path = "/v1.0/users/oncall-mailbox%40contoso.com/sendMail";
    graph.mount_token_success(1).await;
    graph
        .mount_meeting_created(MockGraph::meeting("meeting-sender"), 1)
        .await;
    graph.mount_send_mail_success(sender_path, 1).await;
    graph.forbid_post(SEND_MAIL_PATH).await;

    let mut vars = graph.config_vars();
    vars.insert(
        "FROM_EMAIL".to_string(),
        "oncall-mailbox@contoso.com".to_string(),
    );
    let config = ic_service::config::Config::from_vars(&vars)?;

    let server = TestIcServer::spawn(config).await?;
    let response = server
        .post_incident(json!({ "participants": ["a@x.com"] }))
        .await?;

    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_each_invocation_is_independent() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(2).await;
    graph
        .mount_meeting_created(MockGraph::meeting("meeting-repeat"), 2)
        .await;
    graph.mount_send_mail_success(SEND_MAIL_PATH, 2).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let request = json!({ "subject": "Same incident", "participants": ["a@x.com"] });

    let first = server.post_incident(request.clone()).await?;
    let second = server.post_incident(request).await?;

    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 200);
    assert_eq!(graph.requests_to(TOKEN_PATH).await.len(), 2);

    Ok(())
}

// ============================================================================
// Validation
// ============================================================================

async fn assert_rejected_without_downstream_calls(body: Value) -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(0).await;
    graph.forbid_post(MEETINGS_PATH).await;
    graph.forbid_post(SEND_MAIL_PATH).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server.post_incident(body).await?;

    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await?, "participants array required");

    Ok(())
}

#[tokio::test]
async fn test_empty_participants_rejected() -> Result<(), anyhow::Error> {
    assert_rejected_without_downstream_calls(json!({
        "priority": "P1",
        "subject": "X",
        "participants": []
    }))
    .await
}

#[tokio::test]
async fn test_missing_participants_rejected() -> Result<(), anyhow::Error> {
    assert_rejected_without_downstream_calls(json!({ "subject": "X" })).await
}

#[tokio::test]
async fn test_non_array_participants_rejected() -> Result<(), anyhow::Error> {
    assert_rejected_without_downstream_calls(json!({ "participants": "a@x.com" })).await
}

#[tokio::test]
async fn test_unparseable_body_rejected() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(0).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server.post_incident_raw("{not json").await?;

    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await?, "participants array required");

    Ok(())
}

#[tokio::test]
async fn test_non_numeric_duration_rejected() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(0).await;
    graph.forbid_post(MEETINGS_PATH).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server
        .post_incident(json!({
            "participants": ["a@x.com"],
            "durationMinutes": "half an hour"
        }))
        .await?;

    assert_eq!(response.status(), 400);

    Ok(())
}

// ============================================================================
// Downstream failures
// ============================================================================

#[tokio::test]
async fn test_token_failure_aborts_before_meeting() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_failure(401, "invalid_client").await;
    graph.forbid_post(MEETINGS_PATH).await;
    graph.forbid_post(SEND_MAIL_PATH).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server
        .post_incident(json!({ "participants": ["a@x.com"] }))
        .await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Token request failed: 401 invalid_client");

    Ok(())
}

#[tokio::test]
async fn test_meeting_failure_aborts_before_mail() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(1).await;
    graph
        .mount_meeting_failure(403, r#"{"error":{"code":"Forbidden"}}"#)
        .await;
    graph.forbid_post(SEND_MAIL_PATH).await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server
        .post_incident(json!({ "participants": ["a@x.com"] }))
        .await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Create meeting failed: 403"), "got {message}");
    assert!(message.contains("Forbidden"));

    Ok(())
}

#[tokio::test]
async fn test_missing_join_url_aborts_before_mail() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(1).await;
    graph
        .mount_meeting_created(json!({ "id": "meeting-no-link" }), 1)
        .await;
    graph.forbid_post(SEND_MAIL_PATH).await;
    graph.forbid_deletes().await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server
        .post_incident(json!({ "participants": ["a@x.com"] }))
        .await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "No joinUrl returned from Graph meeting creation");

    Ok(())
}

#[tokio::test]
async fn test_mail_failure_leaves_meeting_in_place() -> Result<(), anyhow::Error> {
    let graph = MockGraph::start().await;
    graph.mount_token_success(1).await;
    graph
        .mount_meeting_created(MockGraph::meeting("meeting-orphan"), 1)
        .await;
    graph.mount_send_mail_failure(400, "ErrorInvalidRecipients").await;
    graph.forbid_deletes().await;

    let server = TestIcServer::spawn(graph.config()).await?;
    let response = server
        .post_incident(json!({ "participants": ["not-an-address"] }))
        .await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "SendMail failed: 400 ErrorInvalidRecipients");

    Ok(())
}
