//! Email delivery backends in waterfall priority order.
//!
//! Each provider knows whether its own credentials are present. The
//! dispatcher walks [`waterfall`] and uses the first configured provider.

pub mod brevo;
pub mod gmail;
pub mod resend;
pub mod sendgrid;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::EmailMessage;
use crate::calendar::OAuthClient;
use crate::config::GlobalConfig;
use crate::{AppError, Result};

pub use brevo::BrevoProvider;
pub use gmail::GmailProvider;
pub use resend::ResendProvider;
pub use sendgrid::SendGridProvider;

/// Sender identity shared by all providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Email address.
    pub address: String,
    /// Display name.
    pub name: String,
}

impl Mailbox {
    /// `Name <address>` form for providers taking a single string.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("{} <{}>", self.name, self.address)
    }
}

/// One interchangeable email delivery backend.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Short provider label used in logs and audit entries.
    fn name(&self) -> &'static str;

    /// Whether this provider has complete credentials.
    fn is_configured(&self) -> bool;

    /// Deliver one message. A single attempt; no retry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integration` on network failure or a non-2xx
    /// response.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Build every provider in priority order: Gmail, Resend, `SendGrid`, Brevo.
#[must_use]
pub fn waterfall(
    config: &GlobalConfig,
    http: &reqwest::Client,
) -> Vec<Arc<dyn NotificationProvider>> {
    let from = Mailbox {
        address: config.email.from_address.clone(),
        name: config.email.from_name.clone(),
    };
    let credentials = &config.credentials;
    let gmail_oauth = credentials
        .oauth()
        .map(|oauth| OAuthClient::new(http.clone(), config.calendar.token_url.clone(), oauth));

    vec![
        Arc::new(GmailProvider::new(
            http.clone(),
            config.email.gmail_api_base.clone(),
            from.clone(),
            gmail_oauth,
        )),
        Arc::new(ResendProvider::new(
            http.clone(),
            config.email.resend_api_base.clone(),
            from.clone(),
            credentials.resend_api_key.clone(),
        )),
        Arc::new(SendGridProvider::new(
            http.clone(),
            config.email.sendgrid_api_base.clone(),
            from.clone(),
            credentials.sendgrid_api_key.clone(),
        )),
        Arc::new(BrevoProvider::new(
            http.clone(),
            config.email.brevo_api_base.clone(),
            from,
            credentials.brevo_api_key.clone(),
        )),
    ]
}

/// Map a provider HTTP response to a delivery result.
pub(crate) async fn check_response(provider: &str, response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    warn!(provider, %status, body, "email provider rejected message");
    Err(AppError::Integration(format!("{provider} returned {status}")))
}

/// Map a transport failure to an integration error.
pub(crate) fn transport_error(provider: &str, err: &reqwest::Error) -> AppError {
    AppError::Integration(format!("{provider} request failed: {err}"))
}
