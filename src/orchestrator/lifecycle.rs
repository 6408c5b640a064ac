//! Appointment state machine and its side effects.
//!
//! Transitions run their steps strictly in sequence: persist, calendar,
//! audit, notify. Calendar and notification failures are absorbed and
//! reported on the [`TransitionReport`]; a failed durable write aborts the
//! transition. When a write fails after a calendar event was created, the
//! event is deleted again before the error is returned.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};

use super::intake::{resolve_slot, BookingRequest};
use super::report::{
    CalendarOutcome, CalendarProbe, HealthReport, NotificationReport, TransitionReport,
};
use crate::audit::{Actor, AuditEntry, AuditLogger, AuditTrail};
use crate::calendar::{CalendarSync, DisabledCalendar, GoogleCalendar, OAuthClient};
use crate::config::GlobalConfig;
use crate::models::appointment::{Appointment, AppointmentStatus, ContactDetails};
use crate::models::settings::Settings;
use crate::models::slot::{Day, SlotTime};
use crate::notify::providers::{self, NotificationProvider};
use crate::notify::templates::TemplateContext;
use crate::notify::{NotificationDispatcher, NotificationKind, Role};
use crate::persistence::appointment_repo::AppointmentRepo;
use crate::persistence::kv::KeyValueStore;
use crate::persistence::locks::KeyLocks;
use crate::persistence::settings_repo::SettingsRepo;
use crate::persistence::slot_ledger::{Reservation, SlotLedger};
use crate::ratelimit::{RateDecision, RateLimiter};
use crate::{AppError, Result};

/// Timeout applied to every outbound integration request.
const HTTP_TIMEOUT_SECS: u64 = 15;

/// Who asked for a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelledBy {
    /// An administrator; a pending appointment counts as rejected.
    Admin,
    /// The customer through the self-service link.
    Customer,
}

/// Coordinates the ledger, calendar, notifications and audit trail.
#[derive(Clone)]
pub struct BookingOrchestrator {
    config: Arc<GlobalConfig>,
    store: Arc<dyn KeyValueStore>,
    appointments: AppointmentRepo,
    settings: SettingsRepo,
    ledger: SlotLedger,
    limiter: RateLimiter,
    audit: AuditTrail,
    calendar: Arc<dyn CalendarSync>,
    notifier: NotificationDispatcher,
}

impl BookingOrchestrator {
    /// Assemble an orchestrator from explicit collaborators.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        store: Arc<dyn KeyValueStore>,
        calendar: Arc<dyn CalendarSync>,
        providers: Vec<Arc<dyn NotificationProvider>>,
    ) -> Self {
        let locks = KeyLocks::new();
        let audit = AuditTrail::new(
            Arc::clone(&store),
            locks.clone(),
            config.audit_ttl(),
            config.audit.max_entries,
        );
        let notifier = NotificationDispatcher::new(
            providers,
            Arc::new(audit.clone()),
            TemplateContext::from_config(&config),
        );

        Self {
            appointments: AppointmentRepo::new(
                Arc::clone(&store),
                locks.clone(),
                config.record_ttl(),
            ),
            settings: SettingsRepo::new(Arc::clone(&store), config.defaults.clone()),
            ledger: SlotLedger::new(Arc::clone(&store), locks.clone(), config.record_ttl()),
            limiter: RateLimiter::new(Arc::clone(&store), locks),
            audit,
            calendar,
            notifier,
            store,
            config,
        }
    }

    /// Build the production integrations from configuration and credentials.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn from_config(config: Arc<GlobalConfig>, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;

        let calendar: Arc<dyn CalendarSync> = match config.credentials.oauth() {
            Some(oauth) => {
                let client =
                    OAuthClient::new(http.clone(), config.calendar.token_url.clone(), oauth);
                Arc::new(GoogleCalendar::new(&config, http.clone(), client))
            }
            None => Arc::new(DisabledCalendar),
        };
        let providers = providers::waterfall(&config, &http);

        Ok(Self::new(config, store, calendar, providers))
    }

    /// Static configuration in use.
    #[must_use]
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Audit trail, for listing.
    #[must_use]
    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    /// Current settings snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the settings cannot be read.
    pub async fn settings(&self) -> Result<Settings> {
        self.settings.load().await
    }

    /// One appointment by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such appointment exists.
    pub async fn appointment(&self, id: &str) -> Result<Appointment> {
        self.appointments
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {id} not found")))
    }

    /// Every indexed appointment, earliest start first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the index or a record cannot be read.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let mut appointments = self.appointments.list_all().await?;
        appointments.sort_by(|a, b| {
            a.appointment_date
                .cmp(&b.appointment_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(appointments)
    }

    /// Most recent audit entries, capped by the configured list limit.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the trail cannot be read.
    pub async fn list_audit(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        let cap = self.config.audit.list_limit;
        self.audit.list(limit.map_or(cap, |limit| limit.min(cap))).await
    }

    /// Calendar file for a confirmed appointment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown ids and
    /// `AppError::InvalidTransition` unless the appointment is confirmed.
    pub async fn calendar_file(&self, id: &str) -> Result<String> {
        let appointment = self.appointment(id).await?;
        if appointment.status != AppointmentStatus::Confirmed {
            return Err(AppError::InvalidTransition(format!(
                "calendar file is only available for confirmed appointments, this one is {}",
                appointment.status.as_str()
            )));
        }
        let context = self.notifier.context();
        let manage_url = context.manage_url(&appointment.id);
        Ok(crate::ics::render(
            &appointment,
            &crate::ics::IcsDetails {
                event_name: &context.event_name,
                location: context.event_location.as_deref(),
                duration_minutes: context.duration_minutes,
                manage_url: &manage_url,
            },
        ))
    }

    /// Count a booking attempt whose body could not be parsed against the
    /// client's rate limit budget.
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` once the client is over budget, `Db` when the
    /// settings cannot be read.
    pub async fn throttle_unparsed(&self, client_id: &str) -> Result<()> {
        let settings = self.settings.load().await?;
        self.throttle(client_id, &settings).await
    }

    async fn throttle(&self, client_id: &str, settings: &Settings) -> Result<()> {
        if let RateDecision::Denied { reset_at } =
            self.limiter.check(client_id, &settings.rate_limit).await
        {
            self.record(
                AuditEntry::new(
                    "booking rate limited",
                    format!("client {client_id} blocked until {}", reset_at.to_rfc3339()),
                )
                .with_actor(&Actor::System),
            )
            .await;
            return Err(AppError::RateLimited { reset_at });
        }
        Ok(())
    }

    /// Admit a new booking from `client_id`.
    ///
    /// # Errors
    ///
    /// Returns `RateLimited`, `Validation`, `DuplicateEmail` or `SlotFull`
    /// before any side effect, and `Db` when the record cannot be stored.
    pub async fn book(
        &self,
        request: &BookingRequest,
        client_id: &str,
    ) -> Result<TransitionReport> {
        self.book_inner(request, client_id)
            .instrument(info_span!("book_appointment", client_id))
            .await
    }

    async fn book_inner(
        &self,
        request: &BookingRequest,
        client_id: &str,
    ) -> Result<TransitionReport> {
        let settings = self.settings.load().await?;
        self.throttle(client_id, &settings).await?;

        let booking = request.validate()?;
        let customer = Actor::Customer(booking.contact.email.clone());
        let (slot, start) = resolve_slot(
            booking.day,
            booking.time,
            &settings,
            self.config.local_offset(),
            Utc::now(),
        );

        if settings.prevent_duplicate_email {
            if let Some(existing) = self
                .appointments
                .find_live_by_email(&booking.contact.email)
                .await?
            {
                self.record(
                    AuditEntry::new(
                        "booking rejected",
                        format!("duplicate email, live booking {} exists", existing.id),
                    )
                    .with_actor(&customer),
                )
                .await;
                return Err(AppError::DuplicateEmail(format!(
                    "{} already holds a booking",
                    booking.contact.email
                )));
            }
        }

        let auto_confirm = settings.auto_confirm();
        let status = if auto_confirm {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Pending
        };
        let mut appointment = Appointment::new(slot, start, booking.contact, status);

        match self
            .ledger
            .try_reserve(&slot, &appointment.id, settings.max_bookings_per_slot)
            .await?
        {
            Reservation::Accepted { position } => {
                info!(slot = %slot, position, appointment_id = %appointment.id, "slot reserved");
            }
            Reservation::SlotFull { holders } => {
                self.record(
                    AuditEntry::new(
                        "booking rejected",
                        format!("slot {slot} full ({holders} bookings)"),
                    )
                    .with_actor(&customer),
                )
                .await;
                return Err(AppError::SlotFull(format!("{slot} is fully booked")));
            }
        }

        let calendar = if auto_confirm {
            self.create_calendar_event(&mut appointment).await
        } else {
            CalendarOutcome::NotAttempted
        };

        if let Err(err) = self.persist_new(&appointment).await {
            error!(appointment_id = %appointment.id, %err, "booking write failed");
            self.compensate_calendar(&appointment).await;
            if let Err(release_err) = self.ledger.release(&slot, &appointment.id).await {
                warn!(%release_err, "failed to release slot after write failure");
            }
            self.record(
                AuditEntry::new("booking failed", format!("{slot}: {err}"))
                    .with_appointment(&appointment.id)
                    .with_actor(&customer),
            )
            .await;
            return Err(err);
        }

        let (action, kind) = if auto_confirm {
            ("booked", NotificationKind::InstantBooked)
        } else {
            ("requested", NotificationKind::Requested)
        };
        self.record(
            AuditEntry::new(
                action,
                format!("{} booked {slot}", appointment.contact.name),
            )
            .with_appointment(&appointment.id)
            .with_actor(&customer),
        )
        .await;
        info!(appointment_id = %appointment.id, status = status.as_str(), "appointment created");

        let mut report = TransitionReport::new(appointment, calendar);
        self.notify(&mut report, Role::Customer, kind, &settings).await;
        self.notify(&mut report, Role::Admin, kind, &settings).await;
        Ok(report)
    }

    /// Confirm a pending appointment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition` unless pending, or `Db`
    /// when the confirmed record cannot be stored.
    pub async fn confirm(&self, id: &str) -> Result<TransitionReport> {
        self.confirm_inner(id)
            .instrument(info_span!("confirm_appointment", appointment_id = id))
            .await
    }

    async fn confirm_inner(&self, id: &str) -> Result<TransitionReport> {
        let settings = self.settings.load().await?;
        let mut appointment = self.appointment(id).await?;
        ensure_transition(&appointment, AppointmentStatus::Confirmed)?;

        let calendar = self.create_calendar_event(&mut appointment).await;
        appointment.status = AppointmentStatus::Confirmed;
        appointment.updated_at = Some(Utc::now());

        if let Err(err) = self.appointments.save(&appointment).await {
            error!(%err, "confirm write failed");
            self.compensate_calendar(&appointment).await;
            self.record(
                AuditEntry::new("confirm failed", err.to_string())
                    .with_appointment(id)
                    .with_actor(&Actor::Admin),
            )
            .await;
            return Err(err);
        }

        self.record(
            AuditEntry::new("confirmed", describe(&appointment))
                .with_appointment(id)
                .with_actor(&Actor::Admin),
        )
        .await;
        info!("appointment confirmed");

        let mut report = TransitionReport::new(appointment, calendar);
        self.notify(&mut report, Role::Customer, NotificationKind::Confirmed, &settings)
            .await;
        self.notify(&mut report, Role::Admin, NotificationKind::Confirmed, &settings)
            .await;
        Ok(report)
    }

    /// Cancel a pending or confirmed appointment.
    ///
    /// An administrator cancelling a pending appointment rejects it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition` when already cancelled, or
    /// `Db` when the cancelled record cannot be stored.
    pub async fn cancel(
        &self,
        id: &str,
        reason: Option<String>,
        by: CancelledBy,
    ) -> Result<TransitionReport> {
        self.cancel_inner(id, reason, by)
            .instrument(info_span!("cancel_appointment", appointment_id = id, ?by))
            .await
    }

    async fn cancel_inner(
        &self,
        id: &str,
        reason: Option<String>,
        by: CancelledBy,
    ) -> Result<TransitionReport> {
        let settings = self.settings.load().await?;
        let mut appointment = self.appointment(id).await?;
        ensure_transition(&appointment, AppointmentStatus::Cancelled)?;

        let rejected =
            by == CancelledBy::Admin && appointment.status == AppointmentStatus::Pending;
        let actor = match by {
            CancelledBy::Admin => Actor::Admin,
            CancelledBy::Customer => Actor::Customer(appointment.contact.email.clone()),
        };

        let calendar = match appointment.google_event_id.take() {
            Some(event_id) => self.delete_calendar_event(id, event_id, &actor).await,
            None => CalendarOutcome::NotAttempted,
        };

        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancellation_reason = reason
            .map(|reason| reason.trim().to_owned())
            .filter(|reason| !reason.is_empty());
        appointment.updated_at = Some(Utc::now());

        if let Err(err) = self.appointments.save(&appointment).await {
            error!(%err, "cancel write failed");
            self.record(
                AuditEntry::new("cancel failed", err.to_string())
                    .with_appointment(id)
                    .with_actor(&actor),
            )
            .await;
            return Err(err);
        }

        let (action, kind) = if rejected {
            ("rejected", NotificationKind::Rejected)
        } else {
            ("cancelled", NotificationKind::Cancelled)
        };
        let mut details = describe(&appointment);
        if let Some(reason) = &appointment.cancellation_reason {
            details.push_str(&format!(", reason: {reason}"));
        }
        self.record(
            AuditEntry::new(action, details)
                .with_appointment(id)
                .with_actor(&actor),
        )
        .await;
        info!(action, "appointment cancelled");

        let mut report = TransitionReport::new(appointment, calendar);
        self.notify(&mut report, Role::Customer, kind, &settings).await;
        if by == CancelledBy::Customer {
            self.notify(&mut report, Role::Admin, kind, &settings).await;
        }
        Ok(report)
    }

    /// Remove an appointment from storage entirely. Sends no notification.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `Db` if removal fails.
    pub async fn delete(&self, id: &str) -> Result<TransitionReport> {
        self.delete_inner(id)
            .instrument(info_span!("delete_appointment", appointment_id = id))
            .await
    }

    async fn delete_inner(&self, id: &str) -> Result<TransitionReport> {
        let mut appointment = self.appointment(id).await?;

        let calendar = match appointment.google_event_id.take() {
            Some(event_id) => self.delete_calendar_event(id, event_id, &Actor::Admin).await,
            None => CalendarOutcome::NotAttempted,
        };

        self.ledger.release(&appointment.slot_key(), id).await?;
        self.appointments.remove_from_index(id).await?;
        self.appointments.delete(id).await?;

        self.record(
            AuditEntry::new("deleted", describe(&appointment))
                .with_appointment(id)
                .with_actor(&Actor::Admin),
        )
        .await;
        info!("appointment deleted");

        Ok(TransitionReport::new(appointment, calendar))
    }

    /// Delete every appointment, slot sequence and the global index.
    ///
    /// Returns the number of appointment records removed.
    ///
    /// # Errors
    ///
    /// Returns `Db` if any removal fails.
    pub async fn delete_all(&self) -> Result<usize> {
        self.delete_all_inner()
            .instrument(info_span!("delete_all_appointments"))
            .await
    }

    async fn delete_all_inner(&self) -> Result<usize> {
        let ids = self.appointments.index().await?;
        let mut removed = 0;
        for id in &ids {
            if let Some(appointment) = self.appointments.get_by_id(id).await? {
                if let Some(event_id) = appointment.google_event_id {
                    self.delete_calendar_event(id, event_id, &Actor::Admin)
                        .await;
                }
                removed += 1;
            }
            self.appointments.delete(id).await?;
        }
        let slots = self.ledger.clear_all().await?;
        self.appointments.clear_index().await?;

        self.record(
            AuditEntry::new(
                "all appointments deleted",
                format!("removed {removed} appointments and {slots} slot sequences"),
            )
            .with_actor(&Actor::Admin),
        )
        .await;
        info!(removed, slots, "all appointments deleted");
        Ok(removed)
    }

    /// Send the reminder template to the customer of a confirmed appointment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `InvalidTransition` unless confirmed.
    pub async fn send_reminder(&self, id: &str) -> Result<TransitionReport> {
        self.send_reminder_inner(id)
            .instrument(info_span!("send_reminder", appointment_id = id))
            .await
    }

    async fn send_reminder_inner(&self, id: &str) -> Result<TransitionReport> {
        let settings = self.settings.load().await?;
        let appointment = self.appointment(id).await?;
        if appointment.status != AppointmentStatus::Confirmed {
            return Err(AppError::InvalidTransition(format!(
                "reminders are only sent for confirmed appointments, this one is {}",
                appointment.status.as_str()
            )));
        }

        let mut report = TransitionReport::new(appointment, CalendarOutcome::NotAttempted);
        self.notify(&mut report, Role::Customer, NotificationKind::Reminder, &settings)
            .await;
        Ok(report)
    }

    /// Send a sample of one template to the admin address.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when no admin email is set.
    pub async fn preview_notification(
        &self,
        role: Role,
        kind: NotificationKind,
    ) -> Result<NotificationReport> {
        let settings = self.settings.load().await?;
        let admin_email = settings
            .admin_email
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                AppError::validation("admin_email", "set an admin email to receive previews")
            })?;

        let sample = sample_appointment(&settings, &self.config, kind);
        let delivery = self
            .notifier
            .preview(role, kind, &sample, &admin_email)
            .await;
        Ok(NotificationReport {
            role,
            kind,
            delivery,
        })
    }

    /// Which integrations are configured.
    pub async fn health(&self) -> HealthReport {
        let settings = self.settings.load().await;
        let store_reachable = self.store.get("settings").await.is_ok();
        let settings = settings.unwrap_or_else(|_| self.config.defaults.clone());
        HealthReport {
            calendar_configured: self.calendar.is_configured(),
            email_provider: self.notifier.active_provider(),
            admin_notifications: settings.admin_recipient().is_some(),
            booking_mode: settings.booking_mode,
            store_reachable,
        }
    }

    /// Live calendar connectivity check.
    pub async fn probe_calendar(&self) -> CalendarProbe {
        if !self.calendar.is_configured() {
            return CalendarProbe {
                ok: false,
                calendar: None,
                error: Some("calendar is not configured".into()),
            };
        }
        match self.calendar.probe().await {
            Ok(name) => CalendarProbe {
                ok: true,
                calendar: Some(name),
                error: None,
            },
            Err(err) => CalendarProbe {
                ok: false,
                calendar: None,
                error: Some(err.to_string()),
            },
        }
    }

    /// Validate and store new settings, auditing the changed fields.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for out-of-range fields and `Db` if the write
    /// fails.
    pub async fn update_settings(&self, next: Settings) -> Result<Settings> {
        next.validate()?;
        let current = self.settings.load().await?;
        let changes = current.diff(&next);
        if changes.is_empty() {
            return Ok(current);
        }

        self.settings.save(&next).await?;
        let summary = changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        info!(changed = changes.len(), "settings updated");
        self.record(AuditEntry::new("settings updated", summary).with_actor(&Actor::Admin))
            .await;
        Ok(next)
    }

    /// Remove every audit entry, leaving one entry recording the clear.
    ///
    /// # Errors
    ///
    /// Returns `Db` if the trail cannot be cleared.
    pub async fn clear_audit(&self) -> Result<usize> {
        let removed = self.audit.clear(&Actor::Admin).await?;
        info!(removed, "audit trail cleared");
        Ok(removed)
    }

    async fn persist_new(&self, appointment: &Appointment) -> Result<()> {
        self.appointments.save(appointment).await?;
        if let Err(err) = self.appointments.add_to_index(&appointment.id).await {
            if let Err(cleanup) = self.appointments.delete(&appointment.id).await {
                warn!(%cleanup, "failed to remove unindexed appointment record");
            }
            return Err(err);
        }
        Ok(())
    }

    async fn create_calendar_event(&self, appointment: &mut Appointment) -> CalendarOutcome {
        if !self.calendar.is_configured() {
            return CalendarOutcome::NotConfigured;
        }
        match self.calendar.create_event(appointment).await {
            Ok(event_id) => {
                appointment.google_event_id = Some(event_id.clone());
                CalendarOutcome::Created { event_id }
            }
            Err(err) => {
                warn!(appointment_id = %appointment.id, %err, "calendar create failed");
                self.record(
                    AuditEntry::new("calendar create failed", err.to_string())
                        .with_appointment(&appointment.id)
                        .with_actor(&Actor::System),
                )
                .await;
                CalendarOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    async fn delete_calendar_event(
        &self,
        appointment_id: &str,
        event_id: String,
        actor: &Actor,
    ) -> CalendarOutcome {
        match self.calendar.delete_event(&event_id).await {
            Ok(()) => CalendarOutcome::Deleted { event_id },
            Err(err) => {
                warn!(appointment_id, event_id, %err, "calendar delete failed");
                self.record(
                    AuditEntry::new(
                        "calendar delete failed",
                        format!("event {event_id}: {err}"),
                    )
                    .with_appointment(appointment_id)
                    .with_actor(actor),
                )
                .await;
                CalendarOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Best-effort removal of an event created earlier in a failed transition.
    async fn compensate_calendar(&self, appointment: &Appointment) {
        let Some(event_id) = appointment.google_event_id.as_deref() else {
            return;
        };
        let details = match self.calendar.delete_event(event_id).await {
            Ok(()) => format!("removed orphaned event {event_id}"),
            Err(err) => {
                error!(event_id, %err, "calendar compensation failed");
                format!("could not remove orphaned event {event_id}: {err}")
            }
        };
        self.record(
            AuditEntry::new("calendar compensation", details)
                .with_appointment(&appointment.id)
                .with_actor(&Actor::System),
        )
        .await;
    }

    async fn notify(
        &self,
        report: &mut TransitionReport,
        role: Role,
        kind: NotificationKind,
        settings: &Settings,
    ) {
        let delivery = self
            .notifier
            .notify(role, kind, &report.appointment, settings)
            .await;
        report.notifications.push(NotificationReport {
            role,
            kind,
            delivery,
        });
    }

    /// Append to the audit trail; a failure is logged, never propagated.
    async fn record(&self, entry: AuditEntry) {
        let action = entry.action.clone();
        if let Err(err) = self.audit.record(entry).await {
            warn!(action, %err, "audit write failed");
        }
    }
}

fn ensure_transition(appointment: &Appointment, next: AppointmentStatus) -> Result<()> {
    if appointment.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!(
            "appointment {} is {} and cannot become {}",
            appointment.id,
            appointment.status.as_str(),
            next.as_str()
        )))
    }
}

fn describe(appointment: &Appointment) -> String {
    format!(
        "{} {} {} ({})",
        appointment.contact.name,
        appointment.day,
        appointment.time,
        appointment.slot_date
    )
}

fn sample_appointment(
    settings: &Settings,
    config: &GlobalConfig,
    kind: NotificationKind,
) -> Appointment {
    let (slot, start) = resolve_slot(
        Day::Friday,
        SlotTime::FIRST,
        settings,
        config.local_offset(),
        Utc::now(),
    );
    let status = match kind {
        NotificationKind::Requested => AppointmentStatus::Pending,
        NotificationKind::Cancelled | NotificationKind::Rejected => AppointmentStatus::Cancelled,
        _ => AppointmentStatus::Confirmed,
    };
    let mut sample = Appointment::new(
        slot,
        start,
        ContactDetails {
            name: "Sample Customer".into(),
            company: Some("Sample Company".into()),
            phone: "+1 555 0100".into(),
            email: "customer@example.com".into(),
            message: Some("This is a preview message.".into()),
        },
        status,
    );
    if status == AppointmentStatus::Cancelled {
        sample.cancellation_reason = Some("sample reason".into());
    }
    sample
}
