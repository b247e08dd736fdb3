//! SQLite-based storage implementation

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use mediq_core::{
    Appointment, AppointmentId, AppointmentStatus, Availability, AvailabilityId, NewAppointment,
    NewAvailability, Profile, Role, TimeWindow, UserId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use super::{
    AppointmentLedger, AvailabilityLedger, BookingLedger, NewUser, PublicUser, Session, SessionId,
    SessionStore, StoreResult, User, UserStore,
};
use crate::error::ServerError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, specialty, created_at, updated_at";

const AVAILABILITY_COLUMNS: &str =
    "id, doctor_id, start_ms, end_ms, doctor_name, specialty, created_at, updated_at";

const APPOINTMENT_COLUMNS: &str = "id, doctor_id, patient_id, start_ms, end_ms, reason, status, \
     doctor_name, patient_name, specialty, created_at, updated_at";

/// SQLite-based store implementing every storage trait
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ServerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ServerError::Internal("database lock poisoned".to_string()))
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ServerError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ServerError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    ///
    /// Ledger rows reference users by id only; the booking coordinator is
    /// the one place that checks those references.
    fn migrate_v1(conn: &Connection) -> Result<(), ServerError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                specialty TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS availability (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                doctor_id INTEGER NOT NULL,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL,
                doctor_name TEXT NOT NULL,
                specialty TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (start_ms < end_ms)
            );
            CREATE INDEX IF NOT EXISTS idx_availability_doctor ON availability(doctor_id, start_ms);
            CREATE INDEX IF NOT EXISTS idx_availability_range ON availability(start_ms, end_ms);

            CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                doctor_id INTEGER NOT NULL,
                patient_id INTEGER NOT NULL,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL,
                doctor_name TEXT NOT NULL,
                patient_name TEXT NOT NULL,
                specialty TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (start_ms < end_ms)
            );
            CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id, start_ms);
            CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id, start_ms);

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, Type::Text, e))
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn window_from_row(row: &Row<'_>, start_idx: usize) -> rusqlite::Result<TimeWindow> {
    let start_ms: i64 = row.get(start_idx)?;
    let end_ms: i64 = row.get(start_idx + 1)?;
    let millis = |idx: usize, ms: i64| {
        DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
            rusqlite::Error::IntegralValueOutOfRange(idx, ms)
        })
    };
    let start = millis(start_idx, start_ms)?;
    let end = millis(start_idx + 1, end_ms)?;
    TimeWindow::new(start, end).map_err(|e| conversion_error(start_idx, Type::Integer, e))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let role: String = row.get(4)?;
    let specialty: Option<String> = row.get(5)?;

    let role = role
        .parse::<Role>()
        .map_err(|e| conversion_error(4, Type::Text, e))?;
    let profile = Profile::new(role, specialty).map_err(|e| conversion_error(5, Type::Text, e))?;

    Ok(User {
        id: UserId(id as u64),
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        profile,
        created_at: parse_timestamp(row, 6)?,
        updated_at: parse_timestamp(row, 7)?,
    })
}

fn availability_from_row(row: &Row<'_>) -> rusqlite::Result<Availability> {
    let id: i64 = row.get(0)?;
    let doctor_id: i64 = row.get(1)?;

    Ok(Availability {
        id: AvailabilityId(id as u64),
        doctor_id: UserId(doctor_id as u64),
        window: window_from_row(row, 2)?,
        doctor_name: row.get(4)?,
        specialty: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
        updated_at: parse_timestamp(row, 7)?,
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let id: i64 = row.get(0)?;
    let doctor_id: i64 = row.get(1)?;
    let patient_id: i64 = row.get(2)?;
    let status: String = row.get(6)?;

    Ok(Appointment {
        id: AppointmentId(id as u64),
        doctor_id: UserId(doctor_id as u64),
        patient_id: UserId(patient_id as u64),
        window: window_from_row(row, 3)?,
        reason: row.get(5)?,
        status: status
            .parse::<AppointmentStatus>()
            .map_err(|e| conversion_error(6, Type::Text, e))?,
        doctor_name: row.get(7)?,
        patient_name: row.get(8)?,
        specialty: row.get(9)?,
        created_at: parse_timestamp(row, 10)?,
        updated_at: parse_timestamp(row, 11)?,
    })
}

fn insert_availability(conn: &Connection, new: NewAvailability) -> StoreResult<Availability> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO availability (doctor_id, start_ms, end_ms, doctor_name, specialty, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            new.doctor_id.0 as i64,
            new.window.start().timestamp_millis(),
            new.window.end().timestamp_millis(),
            new.doctor_name,
            new.specialty,
            now.to_rfc3339(),
        ],
    )?;

    let id = conn.last_insert_rowid() as u64;
    Ok(Availability {
        id: AvailabilityId(id),
        doctor_id: new.doctor_id,
        window: new.window,
        doctor_name: new.doctor_name,
        specialty: new.specialty,
        created_at: now,
        updated_at: now,
    })
}

fn insert_appointment(conn: &Connection, new: NewAppointment) -> StoreResult<Appointment> {
    let now = Utc::now();
    let status = AppointmentStatus::Scheduled;
    conn.execute(
        "INSERT INTO appointments (doctor_id, patient_id, start_ms, end_ms, reason, status,
                                   doctor_name, patient_name, specialty, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            new.doctor_id.0 as i64,
            new.patient_id.0 as i64,
            new.window.start().timestamp_millis(),
            new.window.end().timestamp_millis(),
            new.reason,
            status.as_str(),
            new.doctor_name,
            new.patient_name,
            new.specialty,
            now.to_rfc3339(),
        ],
    )?;

    let id = conn.last_insert_rowid() as u64;
    Ok(Appointment {
        id: AppointmentId(id),
        doctor_id: new.doctor_id,
        patient_id: new.patient_id,
        window: new.window,
        reason: new.reason,
        status,
        doctor_name: new.doctor_name,
        patient_name: new.patient_name,
        specialty: new.specialty,
        created_at: now,
        updated_at: now,
    })
}

fn select_appointment(conn: &Connection, id: AppointmentId) -> StoreResult<Option<Appointment>> {
    Ok(conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.0 as i64],
            appointment_from_row,
        )
        .optional()?)
}

impl UserStore for SqliteStore {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let conn = self.conn()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (email, password_hash, name, role, specialty, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                new_user.email,
                new_user.password_hash,
                new_user.name,
                new_user.profile.role().as_str(),
                new_user.profile.specialty(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return ServerError::DuplicateIdentity;
                }
            }
            ServerError::Internal(e.to_string())
        })?;

        let id = conn.last_insert_rowid() as u64;
        Ok(User {
            id: UserId(id),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            profile: new_user.profile,
            created_at: now,
            updated_at: now,
        })
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.conn()?;

        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?)
    }

    fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<PublicUser>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![user_id.0 as i64],
                user_from_row,
            )
            .optional()?;

        Ok(user.map(PublicUser::from))
    }

    fn count_users(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl AvailabilityLedger for SqliteStore {
    fn create_availability(&self, new: NewAvailability) -> StoreResult<Availability> {
        let conn = self.conn()?;
        insert_availability(&conn, new)
    }

    fn get_availability(&self, id: AvailabilityId) -> StoreResult<Option<Availability>> {
        let conn = self.conn()?;

        Ok(conn
            .query_row(
                &format!("SELECT {AVAILABILITY_COLUMNS} FROM availability WHERE id = ?1"),
                params![id.0 as i64],
                availability_from_row,
            )
            .optional()?)
    }

    fn list_availability_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Availability>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {AVAILABILITY_COLUMNS} FROM availability
             WHERE doctor_id = ?1 ORDER BY start_ms, id"
        ))?;
        let rows = stmt
            .query_map(params![doctor_id.0 as i64], availability_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn find_available_doctors(&self, window: &TimeWindow) -> StoreResult<Vec<Availability>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {AVAILABILITY_COLUMNS} FROM availability
             WHERE start_ms <= ?1 AND end_ms >= ?2 ORDER BY start_ms, id"
        ))?;
        let rows = stmt
            .query_map(
                params![
                    window.start().timestamp_millis(),
                    window.end().timestamp_millis()
                ],
                availability_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn delete_availability(&self, id: AvailabilityId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM availability WHERE id = ?1", params![id.0 as i64])?;
        Ok(())
    }
}

impl AppointmentLedger for SqliteStore {
    fn create_appointment(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let conn = self.conn()?;
        insert_appointment(&conn, new)
    }

    fn get_appointment(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        let conn = self.conn()?;
        select_appointment(&conn, id)
    }

    fn list_appointments_by_doctor(&self, doctor_id: UserId) -> StoreResult<Vec<Appointment>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE doctor_id = ?1 ORDER BY start_ms, id"
        ))?;
        let rows = stmt
            .query_map(params![doctor_id.0 as i64], appointment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn list_appointments_by_patient(&self, patient_id: UserId) -> StoreResult<Vec<Appointment>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE patient_id = ?1 ORDER BY start_ms, id"
        ))?;
        let rows = stmt
            .query_map(params![patient_id.0 as i64], appointment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn update_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<Appointment> {
        let conn = self.conn()?;

        let rows_affected = conn.execute(
            "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id.0 as i64],
        )?;

        if rows_affected == 0 {
            return Err(ServerError::AppointmentNotFound);
        }

        select_appointment(&conn, id)?.ok_or(ServerError::AppointmentNotFound)
    }
}

impl BookingLedger for SqliteStore {
    fn book_slot(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock up front so the containment check
        // and the consume happen against the same snapshot
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let matched = tx
            .query_row(
                &format!(
                    "SELECT {AVAILABILITY_COLUMNS} FROM availability
                     WHERE doctor_id = ?1 AND start_ms <= ?2 AND end_ms >= ?3
                     ORDER BY start_ms, id LIMIT 1"
                ),
                params![
                    new.doctor_id.0 as i64,
                    new.window.start().timestamp_millis(),
                    new.window.end().timestamp_millis()
                ],
                availability_from_row,
            )
            .optional()?
            .ok_or(ServerError::SlotUnavailable)?;

        let remainder = matched
            .window
            .carve(&new.window)
            .ok_or(ServerError::SlotUnavailable)?;

        tx.execute(
            "DELETE FROM availability WHERE id = ?1",
            params![matched.id.0 as i64],
        )?;
        for window in remainder {
            insert_availability(&tx, matched.remainder(window))?;
        }
        let appointment = insert_appointment(&tx, new)?;

        tx.commit()?;
        Ok(appointment)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let conn = self.conn()?;
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session.id.0,
                session.user_id.0 as i64,
                session.created_at.to_rfc3339(),
            ],
        )?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn()?;

        Ok(conn
            .query_row(
                "SELECT id, user_id, created_at FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    let id: String = row.get(0)?;
                    let user_id: i64 = row.get(1)?;
                    Ok(Session {
                        id: SessionId(id),
                        user_id: UserId(user_id as u64),
                        created_at: parse_timestamp(row, 2)?,
                    })
                },
            )
            .optional()?)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        (store, dir) // Return dir to keep it alive
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    fn window(start: u32, end: u32) -> TimeWindow {
        TimeWindow::new(at(start), at(end)).unwrap()
    }

    fn doctor(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hashed_password".to_string(),
            name: "Dr. John Smith".to_string(),
            profile: Profile::Doctor {
                specialty: "Cardiology".to_string(),
            },
        }
    }

    fn publish(store: &SqliteStore, doctor_id: UserId, start: u32, end: u32) -> Availability {
        store
            .create_availability(NewAvailability {
                doctor_id,
                window: window(start, end),
                doctor_name: "Dr. John Smith".to_string(),
                specialty: "Cardiology".to_string(),
            })
            .unwrap()
    }

    fn booking(doctor_id: UserId, start: u32, end: u32) -> NewAppointment {
        NewAppointment {
            doctor_id,
            patient_id: UserId(2),
            window: window(start, end),
            reason: "Regular checkup".to_string(),
            doctor_name: "Dr. John Smith".to_string(),
            patient_name: "Jane Doe".to_string(),
            specialty: "Cardiology".to_string(),
        }
    }

    #[test]
    fn test_create_user_round_trips_profile() {
        let (store, _dir) = create_test_store();

        let user = store.create_user(doctor("doctor@mediq.com")).unwrap();

        let found = store.find_by_email("doctor@mediq.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.profile.specialty(), Some("Cardiology"));

        let public = store.find_by_id(user.id).unwrap().unwrap();
        assert_eq!(public.name, "Dr. John Smith");
        assert!(store.find_by_id(UserId(999)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _dir) = create_test_store();

        store.create_user(doctor("doctor@mediq.com")).unwrap();
        let result = store.create_user(doctor("doctor@mediq.com"));

        assert!(matches!(result, Err(ServerError::DuplicateIdentity)));
        assert_eq!(store.count_users().unwrap(), 1);
    }

    #[test]
    fn test_find_available_doctors_is_containment() {
        let (store, _dir) = create_test_store();
        publish(&store, UserId(1), 9, 17);
        publish(&store, UserId(2), 10, 12);
        publish(&store, UserId(3), 11, 13);

        let found = store.find_available_doctors(&window(10, 11)).unwrap();
        let doctors: Vec<_> = found.iter().map(|a| a.doctor_id).collect();
        assert_eq!(doctors, vec![UserId(1), UserId(2)]);
        assert_eq!(found[0].window, window(9, 17));
    }

    #[test]
    fn test_availability_rejects_inverted_rows() {
        let (store, _dir) = create_test_store();
        let conn = store.conn().unwrap();

        let result = conn.execute(
            "INSERT INTO availability (doctor_id, start_ms, end_ms, doctor_name, specialty, created_at, updated_at)
             VALUES (1, 2000, 1000, 'x', 'y', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_book_slot_splits_window() {
        let (store, _dir) = create_test_store();
        publish(&store, UserId(1), 9, 17);

        let appointment = store.book_slot(booking(UserId(1), 10, 11)).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(
            store.get_appointment(appointment.id).unwrap().unwrap(),
            appointment
        );

        let windows: Vec<_> = store
            .list_availability_by_doctor(UserId(1))
            .unwrap()
            .into_iter()
            .map(|a| a.window)
            .collect();
        assert_eq!(windows, vec![window(9, 10), window(11, 17)]);
    }

    #[test]
    fn test_book_slot_unavailable_leaves_store_untouched() {
        let (store, _dir) = create_test_store();
        let original = publish(&store, UserId(1), 9, 17);

        let result = store.book_slot(booking(UserId(1), 18, 19));
        assert!(matches!(result, Err(ServerError::SlotUnavailable)));

        let remaining = store.list_availability_by_doctor(UserId(1)).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, original.id);
        assert_eq!(remaining[0].window, original.window);
        assert!(store.list_appointments_by_doctor(UserId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_appointments_listed_by_start() {
        let (store, _dir) = create_test_store();
        store.create_appointment(booking(UserId(1), 14, 15)).unwrap();
        store.create_appointment(booking(UserId(1), 9, 10)).unwrap();

        let by_doctor = store.list_appointments_by_doctor(UserId(1)).unwrap();
        assert_eq!(by_doctor[0].window, window(9, 10));
        assert_eq!(by_doctor[1].window, window(14, 15));

        let by_patient = store.list_appointments_by_patient(UserId(2)).unwrap();
        assert_eq!(by_patient.len(), 2);
    }

    #[test]
    fn test_update_status_refreshes_timestamp() {
        let (store, _dir) = create_test_store();
        let appointment = store.create_appointment(booking(UserId(1), 9, 10)).unwrap();

        let completed = store
            .update_appointment_status(appointment.id, AppointmentStatus::Completed)
            .unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert!(completed.updated_at >= appointment.updated_at);

        let missing = store.update_appointment_status(AppointmentId(42), AppointmentStatus::Completed);
        assert!(matches!(missing, Err(ServerError::AppointmentNotFound)));
    }

    #[test]
    fn test_session_lifecycle() {
        let (store, _dir) = create_test_store();

        let user = store.create_user(doctor("doctor@mediq.com")).unwrap();
        let session = store.create(user.id).unwrap();

        assert!(store.get(&session.id).unwrap().is_some());

        store.delete(&session.id).unwrap();
        assert!(store.get(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_sub_millisecond_bounds_match_stored_precision() {
        let (store, _dir) = create_test_store();
        publish(&store, UserId(1), 9, 17);

        // Truncates to 09:00:00.000, leaving only the window after 11:00
        let mut request = booking(UserId(1), 9, 11);
        request.window =
            TimeWindow::new(at(9) + chrono::Duration::microseconds(500), at(11)).unwrap();
        let appointment = store.book_slot(request).unwrap();
        assert_eq!(appointment.window, window(9, 11));
        assert_eq!(
            store.get_appointment(appointment.id).unwrap().unwrap(),
            appointment
        );

        let windows: Vec<_> = store
            .list_availability_by_doctor(UserId(1))
            .unwrap()
            .into_iter()
            .map(|a| a.window)
            .collect();
        assert_eq!(windows, vec![window(11, 17)]);

        // A bound with a sub-millisecond part reads back as written
        let odd = TimeWindow::new(
            at(12) + chrono::Duration::microseconds(1_500),
            at(13) + chrono::Duration::microseconds(250),
        )
        .unwrap();
        let created = store
            .create_availability(NewAvailability {
                doctor_id: UserId(2),
                window: odd,
                doctor_name: "Dr. John Smith".to_string(),
                specialty: "Cardiology".to_string(),
            })
            .unwrap();
        let stored = store.get_availability(created.id).unwrap().unwrap();
        assert_eq!(stored.window, created.window);
    }

    #[test]
    fn test_sub_millisecond_window_is_invalid_range() {
        let (store, _dir) = create_test_store();
        let doctor = store.create_user(doctor("doctor@mediq.com")).unwrap();

        let result = crate::booking::BookingCoordinator::new(&store, &store).publish_availability(
            doctor.id,
            at(9),
            at(9) + chrono::Duration::microseconds(500),
        );

        assert!(matches!(result, Err(ServerError::InvalidRange)));
        assert!(store.list_availability_by_doctor(doctor.id).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let (store, _dir) = create_test_store();
        let availability = publish(&store, UserId(1), 9, 17);

        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE availability SET created_at = 'not-a-timestamp' WHERE id = ?1",
                params![availability.id.0 as i64],
            )
            .unwrap();

        assert!(matches!(
            store.get_availability(availability.id),
            Err(ServerError::Internal(_))
        ));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::open(path).unwrap();
            store.create_user(doctor("doctor@mediq.com")).unwrap();
        }

        let store = SqliteStore::open(path).unwrap();
        assert_eq!(store.count_users().unwrap(), 1);
    }
}
