//! OAuth 2.0 client-credentials token acquisition.
//!
//! A fresh application token is requested on every invocation; nothing is
//! cached between requests. The client secret and the issued token are held
//! as `SecretString` and never logged.

use super::error_body;
use crate::config::Config;
use crate::errors::IcError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const CONTEXT: &str = "Token request failed";

/// Opaque bearer token for the calendaring/mail API.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(SecretString::from(token))
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// OAuth 2.0 token response from the identity provider.
#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl std::fmt::Debug for OAuthTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Exchanges tenant/client credentials for a bearer token.
#[derive(Clone)]
pub struct TokenProvider {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    scope: String,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenProvider {
    pub fn new(client: Client, config: &Config) -> Self {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            config.identity_base_url,
            urlencoding::encode(&config.tenant_id)
        );

        Self {
            client,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.graph_scope.clone(),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Perform one client-credentials exchange.
    ///
    /// # Errors
    ///
    /// - `IcError::Auth` with status and body on a non-success status
    /// - `IcError::Transport` if the request cannot be sent
    /// - `IcError::InvalidResponse` if the success body has no usable token
    #[instrument(skip_all, fields(client_id = %self.client_id))]
    pub async fn acquire(&self) -> Result<AccessToken, IcError> {
        debug!(
            target: "ic.services.token_provider",
            url = %self.token_url,
            "Requesting application token"
        );

        let form_body = [
            ("client_id", self.client_id.as_str()),
            ("scope", self.scope.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form_body)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    target: "ic.services.token_provider",
                    error = %e,
                    "Token request could not be sent"
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
                target: "ic.services.token_provider",
                status = %status,
                "Token request rejected by identity provider"
            );
            return Err(IcError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: OAuthTokenResponse = response.json().await.map_err(|e| {
            warn!(
                target: "ic.services.token_provider",
                error = %e,
                "Failed to parse token response"
            );
            IcError::InvalidResponse {
                context: CONTEXT,
                message: e.to_string(),
            }
        })?;

        if token_response.access_token.is_empty() {
            return Err(IcError::InvalidResponse {
                context: CONTEXT,
                message: "access_token is empty".to_string(),
            });
        }

        debug!(
            target: "ic.services.token_provider",
            token_type = ?token_response.token_type,
            expires_in_secs = ?token_response.expires_in,
            "Application token acquired"
        );

        Ok(AccessToken(SecretString::from(token_response.access_token)))
    }
}
