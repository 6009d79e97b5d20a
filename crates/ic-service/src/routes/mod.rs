//! HTTP routes for the incident call service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::email::IncidentEmailRenderer;
use crate::errors::IcError;
use crate::handlers;
use crate::services::{self, MeetingCreator, Notifier, TokenProvider};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub token_provider: TokenProvider,
    pub meeting_creator: MeetingCreator,
    pub notifier: Notifier,

    /// Notification template, registered once.
    pub email_renderer: IncidentEmailRenderer,
}

impl AppState {
    /// Build the downstream services from configuration.
    ///
    /// # Errors
    ///
    /// - `IcError::Transport` if the HTTP client cannot be built
    /// - `IcError::Render` if the notification template does not parse
    pub fn new(config: &Config) -> Result<Self, IcError> {
        let client = services::build_http_client(config)?;

        Ok(Self {
            token_provider: TokenProvider::new(client.clone(), config),
            meeting_creator: MeetingCreator::new(client.clone(), config),
            notifier: Notifier::new(client, config),
            email_renderer: IncidentEmailRenderer::new()?,
        })
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `POST /api/incident-call` - create a meeting and notify participants
/// - `GET /health` - liveness
/// - TraceLayer for request logging
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/incident-call", post(handlers::create_incident_call))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
