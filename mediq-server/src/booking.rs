//! Booking coordinator
//!
//! The single place where cross-ledger rules are enforced: appointments
//! must fit inside an availability window of the same doctor, the
//! denormalized names are copied from the identity store at write time,
//! and status moves follow the appointment state machine.

use chrono::{DateTime, Utc};
use mediq_core::{
    Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId, NewAppointment,
    NewAvailability, Principal, Profile, TimeWindow, UserId,
};

use crate::error::ServerError;
use crate::store::{BookingLedger, PublicUser, UserStore};

/// A patient's request for a slot with a doctor
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub doctor_id: UserId,
    pub patient_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: String,
}

pub struct BookingCoordinator<'a, U, B> {
    users: &'a U,
    ledger: &'a B,
}

impl<'a, U, B> BookingCoordinator<'a, U, B>
where
    U: UserStore,
    B: BookingLedger,
{
    pub fn new(users: &'a U, ledger: &'a B) -> Self {
        Self { users, ledger }
    }

    fn doctor(&self, doctor_id: UserId) -> Result<(PublicUser, String), ServerError> {
        let user = self
            .users
            .find_by_id(doctor_id)?
            .ok_or(ServerError::DoctorNotFound)?;
        match &user.profile {
            Profile::Doctor { specialty } => {
                let specialty = specialty.clone();
                Ok((user, specialty))
            }
            Profile::Patient => Err(ServerError::DoctorNotFound),
        }
    }

    fn patient(&self, patient_id: UserId) -> Result<PublicUser, ServerError> {
        self.users
            .find_by_id(patient_id)?
            .filter(|u| u.profile == Profile::Patient)
            .ok_or(ServerError::PatientNotFound)
    }

    /// Publish an availability window for a doctor
    pub fn publish_availability(
        &self,
        doctor_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Availability, ServerError> {
        let window = TimeWindow::new(start, end)?;
        let (doctor, specialty) = self.doctor(doctor_id)?;

        let availability = self.ledger.create_availability(NewAvailability {
            doctor_id,
            window,
            doctor_name: doctor.name,
            specialty,
        })?;

        tracing::info!(
            doctor_id = %doctor_id,
            availability_id = %availability.id,
            start = %start,
            end = %end,
            "Availability published"
        );
        Ok(availability)
    }

    /// Remove one of the caller's availability windows.
    ///
    /// Unknown IDs succeed silently; another doctor's window is `Forbidden`.
    pub fn withdraw_availability(
        &self,
        actor: &Principal,
        id: AvailabilityId,
    ) -> Result<(), ServerError> {
        let Some(availability) = self.ledger.get_availability(id)? else {
            return Ok(());
        };
        if availability.doctor_id != actor.id {
            return Err(ServerError::Forbidden);
        }

        self.ledger.delete_availability(id)?;
        tracing::info!(doctor_id = %actor.id, availability_id = %id, "Availability withdrawn");
        Ok(())
    }

    /// Book a slot. The matched availability window is consumed in the same
    /// atomic step as the appointment is written.
    pub fn book(&self, request: BookingRequest) -> Result<Appointment, ServerError> {
        let window = TimeWindow::new(request.start, request.end)?;
        let (doctor, specialty) = self.doctor(request.doctor_id)?;
        let patient = self.patient(request.patient_id)?;

        let result = self.ledger.book_slot(NewAppointment {
            doctor_id: doctor.id,
            patient_id: patient.id,
            window,
            reason: request.reason.trim().to_string(),
            doctor_name: doctor.name,
            patient_name: patient.name,
            specialty,
        });

        match result {
            Ok(appointment) => {
                tracing::info!(
                    appointment_id = %appointment.id,
                    doctor_id = %appointment.doctor_id,
                    patient_id = %appointment.patient_id,
                    start = %request.start,
                    end = %request.end,
                    "Appointment booked"
                );
                Ok(appointment)
            }
            Err(ServerError::SlotUnavailable) => {
                tracing::warn!(
                    doctor_id = %request.doctor_id,
                    patient_id = %request.patient_id,
                    start = %request.start,
                    end = %request.end,
                    "Requested slot is not inside any availability window"
                );
                Err(ServerError::SlotUnavailable)
            }
            Err(e) => Err(e),
        }
    }

    /// Move an appointment to a new status on behalf of `actor`.
    ///
    /// Only the appointment's doctor or patient may act; patients may only
    /// cancel. Completed and cancelled appointments are final.
    pub fn transition(
        &self,
        actor: &Principal,
        id: AppointmentId,
        next: AppointmentStatus,
    ) -> Result<Appointment, ServerError> {
        let appointment = self
            .ledger
            .get_appointment(id)?
            .ok_or(ServerError::AppointmentNotFound)?;

        if !appointment.involves(actor.id) {
            return Err(ServerError::Forbidden);
        }
        if actor.is_patient() && next != AppointmentStatus::Cancelled {
            return Err(ServerError::Forbidden);
        }

        let next = appointment.status.transition(next)?;
        let updated = self.ledger.update_appointment_status(id, next)?;

        tracing::info!(
            appointment_id = %id,
            actor_id = %actor.id,
            status = %next,
            "Appointment status changed"
        );
        Ok(updated)
    }
}
