//! Incident call handler.
//!
//! `POST /api/incident-call` runs one invocation through
//! Validating -> Authenticating -> CreatingMeeting -> Notifying -> Responding.
//! Any failure short-circuits to the error response; nothing already done
//! downstream is rolled back.
//!
//! # Request Body
//!
//! ```json
//! {
//!   "priority": "P2",
//!   "subject": "DB down",
//!   "participants": ["a@x.com"],
//!   "startInMinutes": 0,
//!   "durationMinutes": 15
//! }
//! ```
//!
//! # Response
//!
//! - 200 OK: `{"meetingId": "...", "joinUrl": "..."}`
//! - 400 Bad Request: plain-text validation message
//! - 500 Internal Server Error: `{"error": "..."}`

use crate::errors::IcError;
use crate::models::{IncidentCallResponse, IncidentRequest, MeetingWindow};
use crate::routes::AppState;
use crate::services::CreateMeetingRequest;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Handler for POST /api/incident-call
#[instrument(skip_all, name = "ic.incident_call", fields(invocation_id = %Uuid::new_v4()))]
pub async fn create_incident_call(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IncidentCallResponse>, IcError> {
    info!(target: "ic.handlers.incident_call", "Incident call invoked");

    let request = IncidentRequest::parse(&body, Utc::now())?;

    info!(
        target: "ic.handlers.incident_call",
        priority = %request.priority,
        participants = request.participants.len(),
        "Request validated"
    );

    let token = state.token_provider.acquire().await?;

    let window = MeetingWindow::compute(
        Utc::now(),
        request.start_in_minutes,
        request.duration_minutes,
    )?;

    let meeting = state
        .meeting_creator
        .create(&token, &CreateMeetingRequest::new(&request.subject, &window))
        .await?;

    let join_link = meeting
        .join_link()
        .ok_or_else(|| left_in_place(&meeting.id, IcError::MissingJoinUrl))?;

    info!(
        target: "ic.handlers.incident_call",
        meeting_id = %meeting.id,
        join_url_source = join_link.source(),
        "Meeting created"
    );

    let email = state
        .email_renderer
        .compose(&request, &window, join_link.url())
        .map_err(|e| left_in_place(&meeting.id, e))?;

    state
        .notifier
        .send(&token, &request.participants, &email)
        .await
        .map_err(|e| left_in_place(&meeting.id, e))?;

    info!(
        target: "ic.handlers.incident_call",
        meeting_id = %meeting.id,
        "Participants notified"
    );

    Ok(Json(IncidentCallResponse {
        meeting_id: meeting.id.clone(),
        join_url: join_link.url().to_string(),
    }))
}

/// Record that a created meeting stays live after a later failure.
fn left_in_place(meeting_id: &str, error: IcError) -> IcError {
    warn!(
        target: "ic.handlers.incident_call",
        meeting_id = %meeting_id,
        error = %error,
        "Meeting was created but the invocation failed; meeting is left in place"
    );
    error
}
