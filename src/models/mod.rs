//! Domain model module declarations.

pub mod appointment;
pub mod settings;
pub mod slot;
