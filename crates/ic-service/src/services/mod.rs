//! Service layer for the incident call handler.
//!
//! Each service wraps one outbound call. They share a single HTTP client
//! built from [`Config`] and are constructed once at startup.
//!
//! # Components
//!
//! - `token_provider` - client-credentials exchange against the identity provider
//! - `meeting_creator` - online meeting creation for the organizer identity
//! - `notifier` - HTML mail to the participant list

pub mod meeting_creator;
pub mod notifier;
pub mod token_provider;

pub use meeting_creator::{CreateMeetingRequest, MeetingCreator};
pub use notifier::Notifier;
pub use token_provider::{AccessToken, TokenProvider};

use crate::config::Config;
use crate::errors::IcError;
use reqwest::Client;
use std::time::Duration;
use tracing::error;

/// Connection timeout for outbound calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the HTTP client shared by all services.
///
/// # Errors
///
/// Returns `IcError::Transport` if the client cannot be built.
pub fn build_http_client(config: &Config) -> Result<Client, IcError> {
    Client::builder()
        .timeout(config.http_timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(config.http_timeout))
        .build()
        .map_err(|e| {
            error!(target: "ic.services", error = %e, "Failed to build HTTP client");
            IcError::Transport {
                context: "Failed to build HTTP client",
                message: e.to_string(),
            }
        })
}

/// Read a failure response body for diagnostics.
async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {e}>"))
}
