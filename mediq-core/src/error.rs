//! Error types for MediQ domain rules

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::schedule::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Invalid range: end {end} must be after start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Specialty is required for doctors")]
    MissingSpecialty,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}
