//! MediQ booking service
//!
//! Patients and doctors sign up, doctors publish availability windows and
//! patients book appointments inside them. Booking consumes the matched
//! window so the same time cannot be sold twice.

pub mod booking;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

pub use booking::{BookingCoordinator, BookingRequest};
pub use config::Config;
pub use error::ServerError;
pub use seed::seed_demo_data;
pub use state::AppState;
pub use store::{
    AppointmentLedger, AvailabilityLedger, BookingLedger, InMemoryScheduleStore,
    InMemorySessionStore, InMemoryUserStore, SessionStore, SqliteStore, UserStore,
};
