//! Booking lifecycle orchestration.
//!
//! [`BookingOrchestrator`] owns the appointment state machine and drives
//! the slot ledger, calendar adapter, notification dispatcher and audit
//! trail on each transition.

pub mod intake;
pub mod lifecycle;
pub mod report;

pub use intake::{BookingRequest, ValidBooking};
pub use lifecycle::{BookingOrchestrator, CancelledBy};
pub use report::{
    CalendarOutcome, CalendarProbe, HealthReport, NotificationReport, TransitionReport,
};
