//! Brevo transactional email API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;

use super::{check_response, transport_error, Mailbox, NotificationProvider};
use crate::notify::EmailMessage;
use crate::{AppError, Result};

const NAME: &str = "brevo";

/// Sends through `POST /smtp/email` with an `api-key` header.
pub struct BrevoProvider {
    http: reqwest::Client,
    api_base: String,
    from: Mailbox,
    api_key: Option<String>,
}

impl BrevoProvider {
    /// Create the provider; unconfigured when `api_key` is `None`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_base: String,
        from: Mailbox,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            api_base,
            from,
            api_key,
        }
    }
}

#[async_trait]
impl NotificationProvider for BrevoProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Integration("brevo api key missing".into()))?;

        let mut body = json!({
            "sender": { "name": self.from.name, "email": self.from.address },
            "to": [{ "email": message.to }],
            "subject": message.subject,
            "htmlContent": message.html,
            "textContent": message.text,
        });
        if !message.attachments.is_empty() {
            body["attachment"] = message
                .attachments
                .iter()
                .map(|attachment| {
                    json!({
                        "name": attachment.filename,
                        "content": STANDARD.encode(&attachment.content),
                    })
                })
                .collect();
        }

        let response = self
            .http
            .post(format!("{}/smtp/email", self.api_base.trim_end_matches('/')))
            .header("api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(NAME, &err))?;
        check_response(NAME, response).await
    }
}
