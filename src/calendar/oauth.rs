//! OAuth 2 refresh-token exchange shared by the calendar and Gmail.
//!
//! Access tokens are not cached: every call performs a fresh exchange.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::OAuthCredentials;
use crate::{AppError, Result};

/// Token endpoint response; only the access token is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges a long-lived refresh token for short-lived access tokens.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    token_url: String,
    credentials: OAuthCredentials,
}

impl OAuthClient {
    /// Create a client for the given token endpoint.
    #[must_use]
    pub fn new(http: reqwest::Client, token_url: String, credentials: OAuthCredentials) -> Self {
        Self {
            http,
            token_url,
            credentials,
        }
    }

    /// Perform the refresh-token grant and return a bearer access token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integration` on network failure, a non-2xx
    /// response, or an unparseable body.
    pub async fn access_token(&self) -> Result<String> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|err| AppError::Integration(format!("token exchange failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body, "oauth token refresh rejected");
            return Err(AppError::Integration(format!(
                "token exchange returned {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AppError::Integration(format!("malformed token response: {err}")))?;
        debug!("oauth access token refreshed");
        Ok(token.access_token)
    }
}
