//! Incident call error types.
//!
//! Validation failures map to 400 with a plain-text body. Every downstream
//! failure maps to 500 with `{"error": <message>}`, where the message is the
//! error's `Display` text. All errors are logged before conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Incident call error type.
///
/// Maps to HTTP status codes:
/// - Validation: 400 Bad Request (plain text)
/// - everything else: 500 Internal Server Error (JSON)
#[derive(Debug, Error)]
pub enum IcError {
    /// Caller-correctable request problem.
    #[error("{0}")]
    Validation(String),

    /// Identity provider rejected the client-credentials exchange.
    #[error("Token request failed: {status} {body}")]
    Auth { status: u16, body: String },

    /// Meeting API rejected the creation request.
    #[error("Create meeting failed: {status} {body}")]
    MeetingCreation { status: u16, body: String },

    /// Meeting was created but carried no usable join URL.
    #[error("No joinUrl returned from Graph meeting creation")]
    MissingJoinUrl,

    /// Mail API rejected the send request.
    #[error("SendMail failed: {status} {body}")]
    Notification { status: u16, body: String },

    /// Request could not be sent or no response arrived in time.
    #[error("{context}: {message}")]
    Transport {
        context: &'static str,
        message: String,
    },

    /// Success status with a body that could not be decoded.
    #[error("{context}: invalid response body: {message}")]
    InvalidResponse {
        context: &'static str,
        message: String,
    },

    /// Notification body could not be rendered.
    #[error("Failed to render notification: {0}")]
    Render(String),
}

impl IcError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            IcError::Validation(_) => 400,
            IcError::Auth { .. }
            | IcError::MeetingCreation { .. }
            | IcError::MissingJoinUrl
            | IcError::Notification { .. }
            | IcError::Transport { .. }
            | IcError::InvalidResponse { .. }
            | IcError::Render(_) => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for IcError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match &self {
            IcError::Validation(reason) => {
                tracing::info!(target: "ic.errors", reason = %reason, "Rejected invalid request");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            _ => {
                tracing::error!(target: "ic.errors", error = %message, "Function error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { error: message }),
                )
                    .into_response()
            }
        }
    }
}
