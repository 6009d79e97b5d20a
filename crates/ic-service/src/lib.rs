//! Incident Call Service Library
//!
//! A stateless HTTP handler that, given an incident priority and a list of
//! participant addresses, obtains an application token, creates an online
//! meeting for a configured organizer and emails the join link to the
//! participants.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `email` - Notification subject and HTML body
//! - `handlers` - HTTP request handlers
//! - `models` - Request parsing, meeting window, meeting entity
//! - `observability` - Tracing setup
//! - `routes` - Axum router setup
//! - `services` - Token, meeting and mail clients

pub mod config;
pub mod email;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
