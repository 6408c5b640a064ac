//! Gmail API delivery using the shared OAuth refresh token.
//!
//! Messages are assembled as raw RFC 822 MIME (`multipart/mixed` holding a
//! `multipart/alternative` text/html pair plus attachments) and posted
//! base64url-encoded to `users/me/messages/send`.

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde_json::json;
use uuid::Uuid;

use super::{check_response, transport_error, Mailbox, NotificationProvider};
use crate::calendar::OAuthClient;
use crate::notify::EmailMessage;
use crate::{AppError, Result};

const NAME: &str = "gmail";

/// Sends through the Gmail REST API.
pub struct GmailProvider {
    http: reqwest::Client,
    api_base: String,
    from: Mailbox,
    oauth: Option<OAuthClient>,
}

impl GmailProvider {
    /// Create the provider; unconfigured when `oauth` is `None`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_base: String,
        from: Mailbox,
        oauth: Option<OAuthClient>,
    ) -> Self {
        Self {
            http,
            api_base,
            from,
            oauth,
        }
    }
}

#[async_trait]
impl NotificationProvider for GmailProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        self.oauth.is_some()
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let oauth = self
            .oauth
            .as_ref()
            .ok_or_else(|| AppError::Integration("gmail oauth credentials missing".into()))?;
        let token = oauth.access_token().await?;

        let boundary = Uuid::new_v4().simple().to_string();
        let raw = build_mime(&self.from, message, &boundary);

        let response = self
            .http
            .post(format!(
                "{}/users/me/messages/send",
                self.api_base.trim_end_matches('/')
            ))
            .bearer_auth(token)
            .json(&json!({ "raw": URL_SAFE_NO_PAD.encode(raw) }))
            .send()
            .await
            .map_err(|err| transport_error(NAME, &err))?;
        check_response(NAME, response).await
    }
}

/// Longest input slice per encoded-word; 45 bytes encode to 60 base64
/// characters, which keeps `=?UTF-8?B?...?=` within 75.
const ENCODED_WORD_INPUT: usize = 45;

/// Encode a header value for transport.
///
/// Plain ASCII without control characters passes through. Anything else
/// becomes RFC 2047 encoded-words of at most 75 characters, split on char
/// boundaries and folded with CRLF SP, so a value never ends a header line.
#[must_use]
pub fn encode_header(value: &str) -> String {
    if value.is_ascii() && !value.chars().any(|c| c.is_ascii_control()) {
        return value.to_owned();
    }

    let mut words = Vec::new();
    let mut start = 0;
    for (index, c) in value.char_indices() {
        if index + c.len_utf8() - start > ENCODED_WORD_INPUT {
            words.push(encoded_word(&value[start..index]));
            start = index;
        }
    }
    if start < value.len() {
        words.push(encoded_word(&value[start..]));
    }
    words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(chunk))
}

/// Drop control characters from a value that must stay literal, such as
/// an address or a quoted filename.
fn header_literal(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}

/// Assemble the raw MIME message with CRLF line endings.
#[must_use]
pub fn build_mime(from: &Mailbox, message: &EmailMessage, boundary: &str) -> String {
    let mixed = format!("mixed-{boundary}");
    let alternative = format!("alt-{boundary}");
    let mut out = String::new();
    let mut line = |text: &str| {
        out.push_str(text);
        out.push_str("\r\n");
    };

    line(&format!(
        "From: {} <{}>",
        encode_header(&from.name),
        header_literal(&from.address)
    ));
    line(&format!("To: {}", header_literal(&message.to)));
    line(&format!("Subject: {}", encode_header(&message.subject)));
    line("MIME-Version: 1.0");
    line(&format!("Content-Type: multipart/mixed; boundary=\"{mixed}\""));
    line("");

    line(&format!("--{mixed}"));
    line(&format!(
        "Content-Type: multipart/alternative; boundary=\"{alternative}\""
    ));
    line("");
    for (content_type, body) in [
        ("text/plain", message.text.as_str()),
        ("text/html", message.html.as_str()),
    ] {
        line(&format!("--{alternative}"));
        line(&format!("Content-Type: {content_type}; charset=UTF-8"));
        line("Content-Transfer-Encoding: base64");
        line("");
        line(&wrap_base64(body.as_bytes()));
    }
    line(&format!("--{alternative}--"));

    for attachment in &message.attachments {
        line(&format!("--{mixed}"));
        line(&format!(
            "Content-Type: {}",
            header_literal(&attachment.content_type)
        ));
        line(&format!(
            "Content-Disposition: attachment; filename=\"{}\"",
            header_literal(&attachment.filename)
        ));
        line("Content-Transfer-Encoding: base64");
        line("");
        line(&wrap_base64(attachment.content.as_bytes()));
    }
    line(&format!("--{mixed}--"));
    out
}

fn wrap_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    encoded
        .as_bytes()
        .chunks(76)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\r\n")
}
