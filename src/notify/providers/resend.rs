//! Resend transactional email API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;

use super::{check_response, transport_error, Mailbox, NotificationProvider};
use crate::notify::EmailMessage;
use crate::{AppError, Result};

const NAME: &str = "resend";

/// Sends through `POST /emails` with a bearer API key.
pub struct ResendProvider {
    http: reqwest::Client,
    api_base: String,
    from: Mailbox,
    api_key: Option<String>,
}

impl ResendProvider {
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
impl NotificationProvider for ResendProvider {
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
            .ok_or_else(|| AppError::Integration("resend api key missing".into()))?;

        let attachments: Vec<_> = message
            .attachments
            .iter()
            .map(|attachment| {
                json!({
                    "filename": attachment.filename,
                    "content": STANDARD.encode(&attachment.content),
                    "content_type": attachment.content_type,
                })
            })
            .collect();

        let body = json!({
            "from": self.from.formatted(),
            "to": [message.to],
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
            "attachments": attachments,
        });

        let response = self
            .http
            .post(format!("{}/emails", self.api_base.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(NAME, &err))?;
        check_response(NAME, response).await
    }
}
