//! Storage abstractions for the booking service

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemoryScheduleStore, InMemorySessionStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use mediq_core::{
    Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId, NewAppointment,
    NewAvailability, TimeWindow, UserId,
};

use crate::error::ServerError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ServerError>;

/// Trait for user storage
pub trait UserStore: Send + Sync {
    /// Create a new user; fails with `DuplicateIdentity` if the email is taken
    fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Get a user by exact email, credential included
    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Get a user by ID, credential stripped
    fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<PublicUser>>;

    /// Number of registered users
    fn count_users(&self) -> StoreResult<u64>;
}

/// Trait for doctor availability storage
pub trait AvailabilityLedger: Send + Sync {
    /// Publish a new availability window
    fn create_availability(&self, new: NewAvailability) -> StoreResult<Availability>;

    /// Get a window by ID
    fn get_availability(&self, id: AvailabilityId) -> StoreResult<Option<Availability>>;

    /// All windows of a doctor, by start time
    fn list_availability_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Availability>>;

    /// Windows of any doctor that fully contain `window`, by start time
    fn find_available_doctors(&self, window: &TimeWindow) -> StoreResult<Vec<Availability>>;

    /// Remove a window; removing an unknown ID is a no-op
    fn delete_availability(&self, id: AvailabilityId) -> StoreResult<()>;
}

/// Trait for appointment storage
pub trait AppointmentLedger: Send + Sync {
    /// Record an appointment as scheduled, without touching availability
    fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment>;

    /// Get an appointment by ID
    fn get_appointment(&self, id: AppointmentId) -> StoreResult<Option<Appointment>>;

    /// All appointments of a doctor, by start time
    fn list_appointments_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Appointment>>;

    /// All appointments of a patient, by start time
    fn list_appointments_by_patient(&self, patient_id: UserId) -> StoreResult<Vec<Appointment>>;

    /// Overwrite the status; legality of the move is not checked here
    fn update_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<Appointment>;
}

/// Storage able to consume availability and record an appointment as one
/// atomic step
pub trait BookingLedger: AvailabilityLedger + AppointmentLedger {
    /// Find the earliest window of `new.doctor_id` containing `new.window`,
    /// replace it with whatever is left on either side of the booking, and
    /// record the appointment.
    ///
    /// Fails with `SlotUnavailable` when no window contains the request.
    fn book_slot(&self, new: NewAppointment) -> StoreResult<Appointment>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a user
    fn create(&self, user_id: UserId) -> StoreResult<Session>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;
}

// Forwarding impls so one Arc'd store can back several roles in AppState

impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        (**self).create_user(new_user)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).find_by_email(email)
    }

    fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<PublicUser>> {
        (**self).find_by_id(user_id)
    }

    fn count_users(&self) -> StoreResult<u64> {
        (**self).count_users()
    }
}

impl<T: AvailabilityLedger + ?Sized> AvailabilityLedger for Arc<T> {
    fn create_availability(&self, new: NewAvailability) -> StoreResult<Availability> {
        (**self).create_availability(new)
    }

    fn get_availability(&self, id: AvailabilityId) -> StoreResult<Option<Availability>> {
        (**self).get_availability(id)
    }

    fn list_availability_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Availability>> {
        (**self).list_availability_by_doctor(doctor_id)
    }

    fn find_available_doctors(&self, window: &TimeWindow) -> StoreResult<Vec<Availability>> {
        (**self).find_available_doctors(window)
    }

    fn delete_availability(&self, id: AvailabilityId) -> StoreResult<()> {
        (**self).delete_availability(id)
    }
}

impl<T: AppointmentLedger + ?Sized> AppointmentLedger for Arc<T> {
    fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment> {
        (**self).create_appointment(new)
    }

    fn get_appointment(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        (**self).get_appointment(id)
    }

    fn list_appointments_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Appointment>> {
        (**self).list_appointments_by_doctor(doctor_id)
    }

    fn list_appointments_by_patient(&self, patient_id: UserId) -> StoreResult<Vec<Appointment>> {
        (**self).list_appointments_by_patient(patient_id)
    }

    fn update_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<Appointment> {
        (**self).update_appointment_status(id, status)
    }
}

impl<T: BookingLedger + ?Sized> BookingLedger for Arc<T> {
    fn book_slot(&self, new: NewAppointment) -> StoreResult<Appointment> {
        (**self).book_slot(new)
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        (**self).create(user_id)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        (**self).get(session_id)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        (**self).delete(session_id)
    }
}
