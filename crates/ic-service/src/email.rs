//! Incident notification content.
//!
//! The HTML body is rendered with Handlebars. Escaping stays enabled since
//! priority and subject come straight from the caller.

use crate::errors::IcError;
use crate::models::{iso_timestamp, IncidentRequest, MeetingWindow};
use handlebars::Handlebars;
use serde::Serialize;

const INCIDENT_EMAIL_TEMPLATE: &str = include_str!("../templates/incident_email.hbs");
const INCIDENT_EMAIL: &str = "incident_email";

#[derive(Serialize)]
struct IncidentEmailContext<'a> {
    priority: &'a str,
    subject: &'a str,
    start: String,
    join_url: &'a str,
}

/// Rendered subject line and HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentEmail {
    pub subject: String,
    pub html: String,
}

/// Template registry for the notification body, built once at startup.
#[derive(Clone)]
pub struct IncidentEmailRenderer {
    handlebars: Handlebars<'static>,
}

impl std::fmt::Debug for IncidentEmailRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentEmailRenderer")
            .field("template", &INCIDENT_EMAIL)
            .finish()
    }
}

impl IncidentEmailRenderer {
    /// Register the incident email template.
    ///
    /// # Errors
    ///
    /// Returns `IcError::Render` if the template does not parse.
    pub fn new() -> Result<Self, IcError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars
            .register_template_string(INCIDENT_EMAIL, INCIDENT_EMAIL_TEMPLATE)
            .map_err(|e| IcError::Render(format!("Invalid incident email template: {e}")))?;

        Ok(Self { handlebars })
    }

    /// Compose the notification for a created meeting.
    ///
    /// # Errors
    ///
    /// Returns `IcError::Render` if the template fails to render.
    pub fn compose(
        &self,
        request: &IncidentRequest,
        window: &MeetingWindow,
        join_url: &str,
    ) -> Result<IncidentEmail, IcError> {
        let context = IncidentEmailContext {
            priority: &request.priority,
            subject: &request.subject,
            start: iso_timestamp(&window.start),
            join_url,
        };

        let html = self
            .handlebars
            .render(INCIDENT_EMAIL, &context)
            .map_err(|e| IcError::Render(e.to_string()))?;

        Ok(IncidentEmail {
            subject: format!("[{}] {} - Teams meeting", request.priority, request.subject),
            html,
        })
    }
}
