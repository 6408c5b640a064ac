//! `SendGrid` v3 mail send API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;

use super::{check_response, transport_error, Mailbox, NotificationProvider};
use crate::notify::EmailMessage;
use crate::{AppError, Result};

const NAME: &str = "sendgrid";

/// Sends through `POST /mail/send` with a bearer API key.
pub struct SendGridProvider {
    http: reqwest::Client,
    api_base: String,
    from: Mailbox,
    api_key: Option<String>,
}

impl SendGridProvider {
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
impl NotificationProvider for SendGridProvider {
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
            .ok_or_else(|| AppError::Integration("sendgrid api key missing".into()))?;

        let mut body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from.address, "name": self.from.name },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        });
        if !message.attachments.is_empty() {
            body["attachments"] = message
                .attachments
                .iter()
                .map(|attachment| {
                    json!({
                        "content": STANDARD.encode(&attachment.content),
                        "filename": attachment.filename,
                        "type": attachment.content_type,
                        "disposition": "attachment",
                    })
                })
                .collect();
        }

        let response = self
            .http
            .post(format!("{}/mail/send", self.api_base.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(NAME, &err))?;
        check_response(NAME, response).await
    }
}
