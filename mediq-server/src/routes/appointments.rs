//! Appointment endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use mediq_core::{Appointment, AppointmentId, AppointmentStatus, Role, UserId};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::booking::BookingRequest;
use crate::error::ServerError;
use crate::state::AppState;
use crate::store::{AppointmentLedger, BookingLedger, SessionStore, UserStore};

use super::session::require_principal;

#[derive(Deserialize)]
pub struct BookRequest {
    pub doctor_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub success: bool,
    pub appointment: Appointment,
}

#[derive(Serialize)]
pub struct AppointmentListResponse {
    pub success: bool,
    pub appointments: Vec<Appointment>,
}

/// POST /api/appointments
pub async fn book<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let principal = require_principal(&cookies, state.as_ref())?;
    if !principal.is_patient() {
        return Err(ServerError::Forbidden);
    }

    let appointment = state.coordinator().book(BookingRequest {
        doctor_id: req.doctor_id,
        patient_id: principal.id,
        start: req.start,
        end: req.end,
        reason: req.reason,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(AppointmentResponse {
            success: true,
            appointment,
        }),
    ))
}

/// GET /api/appointments
pub async fn list_mine<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
) -> Result<Json<AppointmentListResponse>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let principal = require_principal(&cookies, state.as_ref())?;

    let appointments = match principal.role() {
        Role::Doctor => state.ledger.list_appointments_by_doctor(principal.id)?,
        Role::Patient => state.ledger.list_appointments_by_patient(principal.id)?,
    };

    Ok(Json(AppointmentListResponse {
        success: true,
        appointments,
    }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /api/appointments/{id}/status
pub async fn update_status<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<AppointmentResponse>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let principal = require_principal(&cookies, state.as_ref())?;
    let next = req.status.parse::<AppointmentStatus>()?;

    let appointment = state
        .coordinator()
        .transition(&principal, AppointmentId(id), next)?;

    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}
