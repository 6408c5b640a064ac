//! Google Calendar v3 events adapter.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::oauth::OAuthClient;
use super::CalendarSync;
use crate::config::GlobalConfig;
use crate::models::appointment::Appointment;
use crate::{AppError, Result};

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CalendarResource {
    #[serde(default)]
    summary: Option<String>,
}

/// Calendar adapter backed by the Google Calendar REST API.
#[derive(Clone)]
pub struct GoogleCalendar {
    http: reqwest::Client,
    oauth: OAuthClient,
    api_base: String,
    calendar_id: String,
    duration_minutes: u32,
    event_name: String,
    event_location: Option<String>,
    public_base_url: String,
}

impl GoogleCalendar {
    /// Build an adapter from static configuration and an OAuth client.
    #[must_use]
    pub fn new(config: &GlobalConfig, http: reqwest::Client, oauth: OAuthClient) -> Self {
        Self {
            http,
            oauth,
            api_base: config.calendar.api_base.clone(),
            calendar_id: config.calendar.calendar_id.clone(),
            duration_minutes: config.calendar.duration_minutes,
            event_name: config.event_name.clone(),
            event_location: config.event_location.clone(),
            public_base_url: config.public_base_url.clone(),
        }
    }

    fn calendar_url(&self, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|err| AppError::Integration(format!("invalid calendar api base: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| AppError::Integration("calendar api base cannot hold a path".into()))?
            .pop_if_empty()
            .push("calendars")
            .push(&self.calendar_id)
            .extend(tail);
        Ok(url)
    }

    fn event_body(&self, appointment: &Appointment) -> serde_json::Value {
        let contact = &appointment.contact;
        let mut description = format!(
            "Name: {}\nEmail: {}\nPhone: {}",
            contact.name, contact.email, contact.phone
        );
        if let Some(company) = &contact.company {
            description.push_str(&format!("\nCompany: {company}"));
        }
        if let Some(message) = &contact.message {
            description.push_str(&format!("\nMessage: {message}"));
        }
        description.push_str(&format!(
            "\nManage: {}/appointments/{}",
            self.public_base_url.trim_end_matches('/'),
            appointment.id
        ));

        json!({
            "summary": format!("{}: {}", self.event_name, contact.name),
            "description": description,
            "location": self.event_location,
            "start": {
                "dateTime": appointment.appointment_date.to_rfc3339(),
                "timeZone": "UTC",
            },
            "end": {
                "dateTime": appointment.end_time(self.duration_minutes).to_rfc3339(),
                "timeZone": "UTC",
            },
            "attendees": [{ "email": contact.email, "displayName": contact.name }],
        })
    }
}

#[async_trait]
impl CalendarSync for GoogleCalendar {
    fn is_configured(&self) -> bool {
        true
    }

    async fn create_event(&self, appointment: &Appointment) -> Result<String> {
        let token = self.oauth.access_token().await?;
        let url = self.calendar_url(&["events"])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&self.event_body(appointment))
            .send()
            .await
            .map_err(|err| AppError::Integration(format!("calendar create failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body, appointment_id = %appointment.id, "calendar create rejected");
            return Err(AppError::Integration(format!(
                "calendar create returned {status}"
            )));
        }

        let created: CreatedEvent = response
            .json()
            .await
            .map_err(|err| AppError::Integration(format!("malformed calendar response: {err}")))?;
        debug!(event_id = %created.id, appointment_id = %appointment.id, "calendar event created");
        Ok(created.id)
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        let token = self.oauth.access_token().await?;
        let url = self.calendar_url(&["events", event_id])?;

        let response = self
            .http
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AppError::Integration(format!("calendar delete failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, event_id, "calendar delete rejected");
            return Err(AppError::Integration(format!(
                "calendar delete returned {status}"
            )));
        }
        debug!(event_id, "calendar event deleted");
        Ok(())
    }

    async fn probe(&self) -> Result<String> {
        let token = self.oauth.access_token().await?;
        let url = self.calendar_url(&[])?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AppError::Integration(format!("calendar probe failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Integration(format!(
                "calendar probe returned {status}"
            )));
        }

        let calendar: CalendarResource = response
            .json()
            .await
            .map_err(|err| AppError::Integration(format!("malformed calendar response: {err}")))?;
        Ok(calendar
            .summary
            .unwrap_or_else(|| self.calendar_id.clone()))
    }
}
