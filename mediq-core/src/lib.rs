//! MediQ Core Library
//!
//! Domain model for appointment booking:
//! - Doctors publish availability windows
//! - Patients book appointments that must fit inside one of those windows
//! - Booked ranges are carved out of the window they consumed

pub mod error;
pub mod identity;
pub mod schedule;
pub mod window;

pub use error::Error;
pub use identity::{Principal, Profile, Role, UserId};
pub use schedule::{
    Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId, NewAppointment,
    NewAvailability,
};
pub use window::TimeWindow;

/// Result type for mediq-core operations
pub type Result<T> = std::result::Result<T, Error>;
