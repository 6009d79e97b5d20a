//! Online meeting creation for the configured organizer.

use super::{error_body, AccessToken};
use crate::config::Config;
use crate::errors::IcError;
use crate::models::{iso_timestamp, MeetingWindow, OnlineMeeting};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

const CONTEXT: &str = "Create meeting failed";

/// Body of the create-online-meeting call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub subject: String,
    pub start_date_time: String,
    pub end_date_time: String,
}

impl CreateMeetingRequest {
    pub fn new(subject: &str, window: &MeetingWindow) -> Self {
        Self {
            subject: subject.to_string(),
            start_date_time: iso_timestamp(&window.start),
            end_date_time: iso_timestamp(&window.end),
        }
    }
}

/// Creates online meetings scoped to the organizer identity.
#[derive(Debug, Clone)]
pub struct MeetingCreator {
    client: Client,
    meetings_url: String,
}

impl MeetingCreator {
    pub fn new(client: Client, config: &Config) -> Self {
        let meetings_url = format!(
            "{}/users/{}/onlineMeetings",
            config.graph_base_url,
            urlencoding::encode(&config.organizer_upn)
        );

        Self {
            client,
            meetings_url,
        }
    }

    pub fn meetings_url(&self) -> &str {
        &self.meetings_url
    }

    /// Create one online meeting.
    ///
    /// The join URL is not resolved here; callers use
    /// [`OnlineMeeting::join_link`].
    ///
    /// # Errors
    ///
    /// - `IcError::MeetingCreation` with status and body on a non-success status
    /// - `IcError::Transport` if the request cannot be sent
    /// - `IcError::InvalidResponse` if the success body is not a meeting
    #[instrument(skip_all, fields(subject = %request.subject))]
    pub async fn create(
        &self,
        token: &AccessToken,
        request: &CreateMeetingRequest,
    ) -> Result<OnlineMeeting, IcError> {
        let response = self
            .client
            .post(&self.meetings_url)
            .header("Authorization", token.bearer())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    target: "ic.services.meeting_creator",
                    error = %e,
                    "Meeting request could not be sent"
                );
                IcError::Transport {
                    context: CONTEXT,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = error_body(response).await;
            warn!(
                target: "ic.services.meeting_creator",
                status = %status,
                "Meeting creation rejected"
            );
            return Err(IcError::MeetingCreation {
                status: status.as_u16(),
                body,
            });
        }

        let meeting: OnlineMeeting = response.json().await.map_err(|e| {
            warn!(
                target: "ic.services.meeting_creator",
                error = %e,
                "Failed to parse meeting response"
            );
            IcError::InvalidResponse {
                context: CONTEXT,
                message: e.to_string(),
            }
        })?;

        debug!(
            target: "ic.services.meeting_creator",
            meeting_id = %meeting.id,
            "Online meeting created"
        );

        Ok(meeting)
    }
}
