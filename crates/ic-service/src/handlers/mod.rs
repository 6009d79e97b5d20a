//! HTTP request handlers for the incident call service.

pub mod health;
pub mod incident_call;

pub use health::health_check;
pub use incident_call::create_incident_call;
