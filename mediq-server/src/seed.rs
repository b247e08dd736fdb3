//! Demo data for local runs

use chrono::{TimeZone, Utc};

use crate::booking::{BookingCoordinator, BookingRequest};
use crate::error::ServerError;
use crate::identity::{sign_up, SignUpForm};
use crate::store::{BookingLedger, UserStore};

pub const DEMO_DOCTOR_EMAIL: &str = "doctor@mediq.com";
pub const DEMO_PATIENT_EMAIL: &str = "patient@mediq.com";
pub const DEMO_PASSWORD: &str = "password123";

fn demo_form(email: &str, name: &str, role: &str, specialty: Option<&str>) -> SignUpForm {
    SignUpForm {
        email: Some(email.to_string()),
        password: Some(DEMO_PASSWORD.to_string()),
        name: Some(name.to_string()),
        role: Some(role.to_string()),
        specialty: specialty.map(str::to_string),
    }
}

/// Load a demo doctor, patient, availability window and booking.
///
/// Does nothing when any user already exists. Returns whether data was
/// written.
pub fn seed_demo_data<U, B>(users: &U, ledger: &B, bcrypt_cost: u32) -> Result<bool, ServerError>
where
    U: UserStore,
    B: BookingLedger,
{
    if users.count_users()? > 0 {
        tracing::debug!("Users already present, skipping demo seed");
        return Ok(false);
    }

    let doctor = sign_up(
        users,
        demo_form(DEMO_DOCTOR_EMAIL, "Dr. John Smith", "doctor", Some("Cardiology")),
        bcrypt_cost,
    )?;
    let patient = sign_up(
        users,
        demo_form(DEMO_PATIENT_EMAIL, "Jane Doe", "patient", None),
        bcrypt_cost,
    )?;

    let at = |hour: u32| {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0)
            .single()
            .ok_or_else(|| ServerError::Internal("invalid demo timestamp".to_string()))
    };

    let coordinator = BookingCoordinator::new(users, ledger);
    coordinator.publish_availability(doctor.id, at(9)?, at(17)?)?;
    let appointment = coordinator.book(BookingRequest {
        doctor_id: doctor.id,
        patient_id: patient.id,
        start: at(10)?,
        end: at(11)?,
        reason: "Regular checkup".to_string(),
    })?;

    tracing::info!(
        doctor_id = %doctor.id,
        patient_id = %patient.id,
        appointment_id = %appointment.id,
        "Demo data seeded"
    );
    Ok(true)
}
