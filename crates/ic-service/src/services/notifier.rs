//! Mail notification from the sender identity.
//!
//! One message is sent per invocation with every participant addressed as a
//! direct recipient. The recipient list is validated upstream.

use super::{error_body, AccessToken};
use crate::config::Config;
use crate::email::IncidentEmail;
use crate::errors::IcError;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

const CONTEXT: &str = "SendMail failed";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    message: MailMessage<'a>,
    save_to_sent_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailMessage<'a> {
    subject: &'a str,
    body: ItemBody<'a>,
    to_recipients: Vec<Recipient<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient<'a> {
    email_address: EmailAddress<'a>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    address: &'a str,
}

impl<'a> SendMailRequest<'a> {
    fn new(recipients: &'a [String], email: &'a IncidentEmail) -> Self {
        Self {
            message: MailMessage {
                subject: &email.subject,
                body: ItemBody {
                    content_type: "HTML",
                    content: &email.html,
                },
                to_recipients: recipients
                    .iter()
                    .map(|address| Recipient {
                        email_address: EmailAddress { address },
                    })
                    .collect(),
            },
            save_to_sent_items: true,
        }
    }
}

/// Sends the incident email through the mail API.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    send_mail_url: String,
}

impl Notifier {
    pub fn new(client: Client, config: &Config) -> Self {
        let send_mail_url = format!(
            "{}/users/{}/sendMail",
            config.graph_base_url,
            urlencoding::encode(&config.from_email)
        );

        Self {
            client,
            send_mail_url,
        }
    }

    pub fn send_mail_url(&self) -> &str {
        &self.send_mail_url
    }

    /// Send `email` to all `recipients`.
    ///
    /// # Errors
    ///
    /// - `IcError::Notification` with status and body on a non-success status
    /// - `IcError::Transport` if the request cannot be sent
    #[instrument(skip_all, fields(recipients = recipients.len()))]
    pub async fn send(
        &self,
        token: &AccessToken,
        recipients: &[String],
        email: &IncidentEmail,
    ) -> Result<(), IcError> {
        let request = SendMailRequest::new(recipients, email);

        let response = self
            .client
            .post(&self.send_mail_url)
            .header("Authorization", token.bearer())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    target: "ic.services.notifier",
                    error = %e,
                    "SendMail request could not be sent"
                );
                IcError::Transport {
                    context: CONTEXT,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = error_body(response).await;
            warn!(target: "ic.services.notifier", status = %status, "SendMail rejected");
            return Err(IcError::Notification {
                status: status.as_u16(),
                body,
            });
        }

        debug!(target: "ic.services.notifier", status = %status, "Notification sent");

        Ok(())
    }
}
