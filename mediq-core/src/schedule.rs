//! Availability windows and appointments

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::window::TimeWindow;
use crate::Error;

/// Unique availability window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AvailabilityId(pub u64);

/// Unique appointment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppointmentId(pub u64);

impl fmt::Display for AvailabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled appointments never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed | AppointmentStatus::Cancelled
            )
        )
    }

    /// Check a move to `next`, returning the new status if it is allowed
    pub fn transition(self, next: AppointmentStatus) -> Result<AppointmentStatus, Error> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A window to be published by a doctor.
///
/// `doctor_name` and `specialty` are copied from the doctor's user record
/// at write time so listings need no lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAvailability {
    pub doctor_id: UserId,
    pub window: TimeWindow,
    pub doctor_name: String,
    pub specialty: String,
}

/// A stored availability window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub id: AvailabilityId,
    pub doctor_id: UserId,
    #[serde(flatten)]
    pub window: TimeWindow,
    pub doctor_name: String,
    pub specialty: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Availability {
    /// The publish request for a piece of this window, keeping the
    /// denormalized doctor fields
    pub fn remainder(&self, window: TimeWindow) -> NewAvailability {
        NewAvailability {
            doctor_id: self.doctor_id,
            window,
            doctor_name: self.doctor_name.clone(),
            specialty: self.specialty.clone(),
        }
    }
}

/// A booking to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub doctor_id: UserId,
    pub patient_id: UserId,
    pub window: TimeWindow,
    pub reason: String,
    pub doctor_name: String,
    pub patient_name: String,
    pub specialty: String,
}

/// A stored appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub doctor_id: UserId,
    pub patient_id: UserId,
    #[serde(flatten)]
    pub window: TimeWindow,
    pub reason: String,
    pub status: AppointmentStatus,
    pub doctor_name: String,
    pub patient_name: String,
    pub specialty: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether `user` is the doctor or the patient of this appointment
    pub fn involves(&self, user: UserId) -> bool {
        self.doctor_id == user || self.patient_id == user
    }
}
