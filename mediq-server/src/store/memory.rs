//! In-memory storage implementations

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use mediq_core::{
    Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId, NewAppointment,
    NewAvailability, TimeWindow, UserId,
};
use uuid::Uuid;

use super::{
    AppointmentLedger, AvailabilityLedger, BookingLedger, NewUser, PublicUser, Session, SessionId,
    SessionStore, StoreResult, User, UserStore,
};
use crate::error::ServerError;

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| ServerError::Internal("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| ServerError::Internal("store lock poisoned".to_string()))
}

#[derive(Default)]
struct UserTables {
    users: BTreeMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    next_id: u64,
}

/// In-memory user store
pub struct InMemoryUserStore {
    tables: RwLock<UserTables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(UserTables {
                next_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = write(&self.tables)?;
        // Emails are matched exactly as stored
        if tables.by_email.contains_key(&new_user.email) {
            return Err(ServerError::DuplicateIdentity);
        }

        let id = UserId(tables.next_id);
        tables.next_id += 1;

        let now = Utc::now();
        let user = User {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            profile: new_user.profile,
            created_at: now,
            updated_at: now,
        };
        tables.by_email.insert(user.email.clone(), id);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = read(&self.tables)?;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<PublicUser>> {
        let tables = read(&self.tables)?;
        Ok(tables.users.get(&user_id).cloned().map(PublicUser::from))
    }

    fn count_users(&self) -> StoreResult<u64> {
        Ok(read(&self.tables)?.users.len() as u64)
    }
}

#[derive(Default)]
struct ScheduleTables {
    availability: BTreeMap<AvailabilityId, Availability>,
    appointments: BTreeMap<AppointmentId, Appointment>,
    next_availability_id: u64,
    next_appointment_id: u64,
}

impl ScheduleTables {
    fn insert_availability(&mut self, new: NewAvailability) -> Availability {
        self.next_availability_id += 1;
        let now = Utc::now();
        let availability = Availability {
            id: AvailabilityId(self.next_availability_id),
            doctor_id: new.doctor_id,
            window: new.window,
            doctor_name: new.doctor_name,
            specialty: new.specialty,
            created_at: now,
            updated_at: now,
        };
        self.availability
            .insert(availability.id, availability.clone());
        availability
    }

    fn insert_appointment(&mut self, new: NewAppointment) -> Appointment {
        self.next_appointment_id += 1;
        let now = Utc::now();
        let appointment = Appointment {
            id: AppointmentId(self.next_appointment_id),
            doctor_id: new.doctor_id,
            patient_id: new.patient_id,
            window: new.window,
            reason: new.reason,
            status: AppointmentStatus::Scheduled,
            doctor_name: new.doctor_name,
            patient_name: new.patient_name,
            specialty: new.specialty,
            created_at: now,
            updated_at: now,
        };
        self.appointments
            .insert(appointment.id, appointment.clone());
        appointment
    }

    fn availability_where<F>(&self, predicate: F) -> Vec<Availability>
    where
        F: Fn(&Availability) -> bool,
    {
        let mut found: Vec<Availability> = self
            .availability
            .values()
            .filter(|a| predicate(*a))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.window.start(), a.id));
        found
    }

    fn appointments_where<F>(&self, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut found: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| predicate(*a))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.window.start(), a.id));
        found
    }
}

/// In-memory availability and appointment ledgers.
///
/// Both tables sit behind one lock so booking can check and consume
/// availability while holding a single write guard.
pub struct InMemoryScheduleStore {
    tables: RwLock<ScheduleTables>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(ScheduleTables::default()),
        }
    }
}

impl Default for InMemoryScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityLedger for InMemoryScheduleStore {
    fn create_availability(&self, new: NewAvailability) -> StoreResult<Availability> {
        Ok(write(&self.tables)?.insert_availability(new))
    }

    fn get_availability(&self, id: AvailabilityId) -> StoreResult<Option<Availability>> {
        Ok(read(&self.tables)?.availability.get(&id).cloned())
    }

    fn list_availability_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Availability>> {
        Ok(read(&self.tables)?.availability_where(|a| a.doctor_id == doctor_id))
    }

    fn find_available_doctors(&self, window: &TimeWindow) -> StoreResult<Vec<Availability>> {
        Ok(read(&self.tables)?.availability_where(|a| a.window.contains(window)))
    }

    fn delete_availability(&self, id: AvailabilityId) -> StoreResult<()> {
        write(&self.tables)?.availability.remove(&id);
        Ok(())
    }
}

impl AppointmentLedger for InMemoryScheduleStore {
    fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment> {
        Ok(write(&self.tables)?.insert_appointment(new))
    }

    fn get_appointment(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        Ok(read(&self.tables)?.appointments.get(&id).cloned())
    }

    fn list_appointments_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Appointment>> {
        Ok(read(&self.tables)?.appointments_where(|a| a.doctor_id == doctor_id))
    }

    fn list_appointments_by_patient(&self, patient_id: UserId) -> StoreResult<Vec<Appointment>> {
        Ok(read(&self.tables)?.appointments_where(|a| a.patient_id == patient_id))
    }

    fn update_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<Appointment> {
        let mut tables = write(&self.tables)?;
        let appointment = tables
            .appointments
            .get_mut(&id)
            .ok_or(ServerError::AppointmentNotFound)?;
        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }
}

impl BookingLedger for InMemoryScheduleStore {
    fn book_slot(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let mut tables = write(&self.tables)?;

        let matched = tables
            .availability_where(|a| a.doctor_id == new.doctor_id && a.window.contains(&new.window))
            .into_iter()
            .next()
            .ok_or(ServerError::SlotUnavailable)?;

        let remainder = matched
            .window
            .carve(&new.window)
            .ok_or(ServerError::SlotUnavailable)?;

        tables.availability.remove(&matched.id);
        for window in remainder {
            tables.insert_availability(matched.remainder(window));
        }

        Ok(tables.insert_appointment(new))
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };
        write(&self.sessions)?.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(read(&self.sessions)?.get(session_id).cloned())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        write(&self.sessions)?.remove(session_id);
        Ok(())
    }
}
