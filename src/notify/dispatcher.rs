//! Renders notifications and delivers them through the provider waterfall.
//!
//! The first configured provider is used exclusively. A configured
//! provider that fails to send does not hand the message to the next one;
//! only an unconfigured provider is skipped. Every attempt, successful or
//! not, appends one audit entry.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::providers::NotificationProvider;
use super::templates::{self, TemplateContext};
use super::{EmailMessage, NotificationKind, Role};
use crate::audit::{Actor, AuditEntry, AuditLogger};
use crate::models::appointment::Appointment;
use crate::models::settings::Settings;

/// Result of one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Accepted by the provider.
    Sent {
        /// Provider that accepted the message.
        provider: String,
    },
    /// No provider accepted the message.
    Failed {
        /// Provider that was tried, if any was configured.
        provider: Option<String>,
        /// Failure description.
        reason: String,
    },
    /// Not attempted.
    Skipped {
        /// Why the notification was not attempted.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// Whether a provider accepted the message.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Notification fan-out point used by the orchestrator.
#[derive(Clone)]
pub struct NotificationDispatcher {
    providers: Vec<Arc<dyn NotificationProvider>>,
    audit: Arc<dyn AuditLogger>,
    context: TemplateContext,
}

impl NotificationDispatcher {
    /// Create a dispatcher over `providers` in priority order.
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn NotificationProvider>>,
        audit: Arc<dyn AuditLogger>,
        context: TemplateContext,
    ) -> Self {
        Self {
            providers,
            audit,
            context,
        }
    }

    /// Template context used for rendering.
    #[must_use]
    pub fn context(&self) -> &TemplateContext {
        &self.context
    }

    /// Name of the provider the waterfall would pick right now.
    #[must_use]
    pub fn active_provider(&self) -> Option<&'static str> {
        self.providers
            .iter()
            .find(|provider| provider.is_configured())
            .map(|provider| provider.name())
    }

    /// Render and deliver one notification.
    ///
    /// Admin notifications are skipped when staff notifications are
    /// disabled or no admin address is set.
    pub async fn notify(
        &self,
        role: Role,
        kind: NotificationKind,
        appointment: &Appointment,
        settings: &Settings,
    ) -> DeliveryOutcome {
        let recipient = match role {
            Role::Customer => appointment.contact.email.clone(),
            Role::Admin => match settings.admin_recipient() {
                Some(email) => email.to_owned(),
                None => {
                    return DeliveryOutcome::Skipped {
                        reason: "admin notifications disabled".into(),
                    }
                }
            },
        };

        let message = templates::render(role, kind, appointment, &self.context, &recipient);
        let label = format!("{role} {kind}");
        self.deliver(&message, &label, Some(&appointment.id)).await
    }

    /// Send a sample of one template to `admin_email`.
    pub async fn preview(
        &self,
        role: Role,
        kind: NotificationKind,
        sample: &Appointment,
        admin_email: &str,
    ) -> DeliveryOutcome {
        let mut message = templates::render(role, kind, sample, &self.context, admin_email);
        message.subject = format!("[Preview] {}", message.subject);
        let label = format!("preview {role} {kind}");
        self.deliver(&message, &label, None).await
    }

    async fn deliver(
        &self,
        message: &EmailMessage,
        label: &str,
        appointment_id: Option<&str>,
    ) -> DeliveryOutcome {
        let outcome = match self
            .providers
            .iter()
            .find(|provider| provider.is_configured())
        {
            None => DeliveryOutcome::Failed {
                provider: None,
                reason: "no email provider configured".into(),
            },
            Some(provider) => match provider.send(message).await {
                Ok(()) => DeliveryOutcome::Sent {
                    provider: provider.name().to_owned(),
                },
                Err(err) => DeliveryOutcome::Failed {
                    provider: Some(provider.name().to_owned()),
                    reason: err.to_string(),
                },
            },
        };

        let Some(entry) = attempt_entry(&outcome, label, &message.to) else {
            return outcome;
        };
        let entry = match appointment_id {
            Some(id) => entry.with_appointment(id),
            None => entry,
        }
        .with_actor(&Actor::System);
        if let Err(err) = self.audit.record(entry).await {
            warn!(%err, "failed to audit notification attempt");
        }
        outcome
    }
}

fn attempt_entry(outcome: &DeliveryOutcome, label: &str, to: &str) -> Option<AuditEntry> {
    match outcome {
        DeliveryOutcome::Sent { provider } => {
            info!(label, provider, to, "notification sent");
            Some(AuditEntry::new(
                "notification sent",
                format!("{label} to {to} via {provider}"),
            ))
        }
        DeliveryOutcome::Failed { provider, reason } => {
            warn!(label, ?provider, to, reason, "notification failed");
            Some(AuditEntry::new(
                "notification failed",
                format!(
                    "{label} to {to} via {}: {reason}",
                    provider.as_deref().unwrap_or("none")
                ),
            ))
        }
        DeliveryOutcome::Skipped { .. } => None,
    }
}
