//! Incident call service configuration.
//!
//! Configuration is loaded from environment variables once at startup and
//! handed to the rest of the service as an explicit struct. The client
//! secret is held as a [`SecretString`] and redacted in Debug output.

use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default identity provider host for the client-credentials grant.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://login.microsoftonline.com";

/// Default root of the calendaring/mail API.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default scope requested for the application token.
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Default outbound HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Port used when neither `BIND_ADDRESS` nor the functions host port is set.
pub const DEFAULT_PORT: u16 = 8080;

/// Incident call service configuration.
#[derive(Clone)]
pub struct Config {
    /// Directory tenant used in the token endpoint path.
    pub tenant_id: String,

    /// OAuth client ID for the client-credentials grant.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: SecretString,

    /// Account under which meetings are created.
    pub organizer_upn: String,

    /// Account mail is sent from. Falls back to the organizer.
    pub from_email: String,

    /// Server bind address.
    pub bind_address: String,

    /// Identity provider base URL (no trailing slash).
    pub identity_base_url: String,

    /// Calendaring/mail API base URL (no trailing slash).
    pub graph_base_url: String,

    /// Scope requested by the token exchange.
    pub graph_scope: String,

    /// Timeout applied to each outbound call.
    pub http_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("organizer_upn", &self.organizer_upn)
            .field("from_email", &self.from_email)
            .field("bind_address", &self.bind_address)
            .field("identity_base_url", &self.identity_base_url)
            .field("graph_base_url", &self.graph_base_url)
            .field("graph_scope", &self.graph_scope)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid HTTP timeout configuration: {0}")]
    InvalidHttpTimeout(String),

    #[error("Invalid port configuration: {0}")]
    InvalidPort(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let tenant_id = required(vars, "AZ_TENANT_ID")?;
        let client_id = required(vars, "AZ_CLIENT_ID")?;
        let client_secret = SecretString::from(required(vars, "AZ_CLIENT_SECRET")?);
        let organizer_upn = required(vars, "ORGANIZER_UPN")?;

        let from_email = optional(vars, "FROM_EMAIL").unwrap_or_else(|| organizer_upn.clone());

        let bind_address = match optional(vars, "BIND_ADDRESS") {
            Some(address) => address,
            None => {
                // Azure Functions custom handlers are told which port to listen on
                let port = match optional(vars, "FUNCTIONS_CUSTOMHANDLER_PORT") {
                    Some(value) => value.parse::<u16>().map_err(|e| {
                        ConfigError::InvalidPort(format!(
                            "FUNCTIONS_CUSTOMHANDLER_PORT must be a valid port, got '{}': {}",
                            value, e
                        ))
                    })?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{}", port)
            }
        };

        let identity_base_url = optional(vars, "IDENTITY_BASE_URL")
            .unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let graph_base_url = optional(vars, "GRAPH_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let graph_scope =
            optional(vars, "GRAPH_SCOPE").unwrap_or_else(|| DEFAULT_GRAPH_SCOPE.to_string());

        let http_timeout_seconds = if let Some(value_str) = optional(vars, "HTTP_TIMEOUT_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidHttpTimeout(format!(
                    "HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidHttpTimeout(
                    "HTTP_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_HTTP_TIMEOUT_SECONDS
        };

        Ok(Config {
            tenant_id,
            client_id,
            client_secret,
            organizer_upn,
            from_email,
            bind_address,
            identity_base_url,
            graph_base_url,
            graph_scope,
            http_timeout: Duration::from_secs(http_timeout_seconds),
        })
    }
}

/// Returns the trimmed value of `key`, treating blank values as unset.
fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required(vars: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    optional(vars, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
