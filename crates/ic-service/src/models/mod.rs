//! Incident call models.
//!
//! Contains the parsed inbound request, the derived meeting window, the
//! meeting entity returned by the calendaring API and the response bodies.

use crate::errors::IcError;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Priority used when the request does not name one.
pub const DEFAULT_PRIORITY: &str = "P1";

/// Minutes from now until the meeting starts, when not supplied.
pub const DEFAULT_START_IN_MINUTES: f64 = 1.0;

/// Meeting length in minutes, when not supplied.
pub const DEFAULT_DURATION_MINUTES: f64 = 30.0;

/// Upper bound for either minute offset (one year).
pub const MAX_OFFSET_MINUTES: f64 = 525_600.0;

/// Exact 400 body for a missing or empty participant list.
pub const PARTICIPANTS_REQUIRED: &str = "participants array required";

/// Formats a timestamp the way the calendaring API and the email expect it:
/// RFC 3339, UTC, millisecond precision, `Z` suffix.
pub fn iso_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Inbound request
// ============================================================================

/// Parsed and defaulted incident call request.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRequest {
    /// Incident priority label (default `P1`).
    pub priority: String,

    /// Meeting and mail subject.
    pub subject: String,

    /// Recipient addresses, in request order. Never empty.
    pub participants: Vec<String>,

    /// Minutes from now until the meeting starts. Clamped at window time.
    pub start_in_minutes: f64,

    /// Meeting length in minutes. Clamped at window time.
    pub duration_minutes: f64,
}

impl IncidentRequest {
    /// Parse a raw request body, applying field defaults.
    ///
    /// A body that is absent, not JSON, or not a JSON object is treated as an
    /// empty object, so it fails on the participant check.
    ///
    /// # Errors
    ///
    /// Returns `IcError::Validation` when participants are missing or empty,
    /// when a participant is not a non-blank string, or when a minute field
    /// is not a finite number within [`MAX_OFFSET_MINUTES`].
    pub fn parse(body: &[u8], now: DateTime<Utc>) -> Result<Self, IcError> {
        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let participants = parse_participants(fields.get("participants"))?;

        let priority = non_empty_string(fields.get("priority"))
            .unwrap_or_else(|| DEFAULT_PRIORITY.to_string());

        let subject = non_empty_string(fields.get("subject"))
            .unwrap_or_else(|| format!("P1 Incident - {}", iso_timestamp(&now)));

        let start_in_minutes = parse_minutes(
            fields.get("startInMinutes"),
            "startInMinutes",
            DEFAULT_START_IN_MINUTES,
        )?;

        let duration_minutes = parse_minutes(
            fields.get("durationMinutes"),
            "durationMinutes",
            DEFAULT_DURATION_MINUTES,
        )?;

        Ok(Self {
            priority,
            subject,
            participants,
            start_in_minutes,
            duration_minutes,
        })
    }
}

fn parse_participants(value: Option<&Value>) -> Result<Vec<String>, IcError> {
    let Some(Value::Array(entries)) = value else {
        return Err(IcError::Validation(PARTICIPANTS_REQUIRED.to_string()));
    };

    if entries.is_empty() {
        return Err(IcError::Validation(PARTICIPANTS_REQUIRED.to_string()));
    }

    entries
        .iter()
        .map(|entry| match entry {
            Value::String(address) if !address.trim().is_empty() => {
                Ok(address.trim().to_string())
            }
            _ => Err(IcError::Validation(
                "participants must be non-empty email address strings".to_string(),
            )),
        })
        .collect()
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Absent, null and empty values take `default`. An explicit `0` is a value,
/// not a missing field: `startInMinutes: 0` starts now and
/// `durationMinutes: 0` is clamped to one minute by [`MeetingWindow::compute`].
fn parse_minutes(value: Option<&Value>, field: &str, default: f64) -> Result<f64, IcError> {
    let minutes = match value {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(default),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => None,
    };

    match minutes {
        Some(m) if m.is_finite() && m <= MAX_OFFSET_MINUTES => Ok(m),
        _ => Err(IcError::Validation(format!(
            "{field} must be a number no greater than {MAX_OFFSET_MINUTES}"
        ))),
    }
}

// ============================================================================
// Meeting window
// ============================================================================

/// Start and end of the meeting to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MeetingWindow {
    /// `start = now + max(0, start_in_minutes)`,
    /// `end = start + max(1, duration_minutes)`.
    ///
    /// # Errors
    ///
    /// Returns `IcError::Validation` if the offsets do not produce a
    /// representable timestamp.
    pub fn compute(
        now: DateTime<Utc>,
        start_in_minutes: f64,
        duration_minutes: f64,
    ) -> Result<Self, IcError> {
        let out_of_range = || IcError::Validation("meeting window is out of range".to_string());

        let lead = minutes_to_delta(start_in_minutes.max(0.0)).ok_or_else(out_of_range)?;
        let length = minutes_to_delta(duration_minutes.max(1.0)).ok_or_else(out_of_range)?;

        let start = now.checked_add_signed(lead).ok_or_else(out_of_range)?;
        let end = start.checked_add_signed(length).ok_or_else(out_of_range)?;

        Ok(Self { start, end })
    }
}

fn minutes_to_delta(minutes: f64) -> Option<TimeDelta> {
    let millis = (minutes * 60_000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let millis = millis as i64;
    TimeDelta::try_milliseconds(millis)
}

// ============================================================================
// Meeting entity
// ============================================================================

/// Online meeting as returned by the creation call.
///
/// Only the fields the service reads are modeled; everything else in the
/// provider's representation is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMeeting {
    pub id: String,

    #[serde(default)]
    join_url: Option<String>,

    #[serde(default)]
    join_web_url: Option<String>,

    #[serde(default)]
    join_information: Option<JoinInformation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinInformation {
    #[serde(default)]
    join_url: Option<String>,
}

/// Where the join URL was found on the meeting representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinLink {
    /// Top-level `joinUrl` or `joinWebUrl`.
    Direct(String),
    /// `joinInformation.joinUrl`.
    Nested(String),
}

impl JoinLink {
    pub fn url(&self) -> &str {
        match self {
            JoinLink::Direct(url) | JoinLink::Nested(url) => url,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            JoinLink::Direct(_) => "direct",
            JoinLink::Nested(_) => "nested",
        }
    }
}

impl OnlineMeeting {
    /// Resolve the join URL: `joinUrl`, then `joinWebUrl`, then
    /// `joinInformation.joinUrl`. Empty strings count as absent.
    pub fn join_link(&self) -> Option<JoinLink> {
        let present = |value: &Option<String>| value.clone().filter(|url| !url.is_empty());

        present(&self.join_url)
            .or_else(|| present(&self.join_web_url))
            .map(JoinLink::Direct)
            .or_else(|| {
                self.join_information
                    .as_ref()
                    .and_then(|info| present(&info.join_url))
                    .map(JoinLink::Nested)
            })
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Success body for `POST /api/incident-call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentCallResponse {
    pub meeting_id: String,
    pub join_url: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status.
    pub status: String,
}
