#![forbid(unsafe_code)]

//! Slot booking service for a three-day event.
//!
//! Admits bookings against a capacity-bounded slot ledger, drives each
//! appointment through its lifecycle, mirrors confirmed appointments to an
//! external calendar, notifies customers and staff by email, and records
//! every state change in an audit trail.

pub mod api;
pub mod audit;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod ics;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod persistence;
pub mod ratelimit;
pub mod validation;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
