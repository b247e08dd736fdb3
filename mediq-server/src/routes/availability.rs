//! Availability endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use mediq_core::{Availability, AvailabilityId, TimeWindow, UserId};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::error::ServerError;
use crate::state::AppState;
use crate::store::{AvailabilityLedger, BookingLedger, SessionStore, UserStore};

use super::session::require_principal;

#[derive(Deserialize)]
pub struct PublishRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub success: bool,
    pub availability: Availability,
}

#[derive(Serialize)]
pub struct AvailabilityListResponse {
    pub success: bool,
    pub availability: Vec<Availability>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// POST /api/availability
pub async fn publish<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Json(req): Json<PublishRequest>,
) -> Result<(StatusCode, Json<AvailabilityResponse>), ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let principal = require_principal(&cookies, state.as_ref())?;
    if !principal.is_doctor() {
        return Err(ServerError::Forbidden);
    }

    let availability = state
        .coordinator()
        .publish_availability(principal.id, req.start, req.end)?;

    Ok((
        StatusCode::CREATED,
        Json(AvailabilityResponse {
            success: true,
            availability,
        }),
    ))
}

#[derive(Deserialize)]
pub struct DoctorQuery {
    pub doctor_id: Option<u64>,
}

/// GET /api/availability?doctor_id=
pub async fn list_by_doctor<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<AvailabilityListResponse>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let principal = require_principal(&cookies, state.as_ref())?;

    let doctor_id = match query.doctor_id {
        Some(id) => UserId(id),
        None if principal.is_doctor() => principal.id,
        None => return Err(ServerError::ValidationError("doctor_id is required".to_string())),
    };

    let availability = state.ledger.list_availability_by_doctor(doctor_id)?;

    Ok(Json(AvailabilityListResponse {
        success: true,
        availability,
    }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// GET /api/availability/search?start=&end=
///
/// Windows of any doctor that cover the whole requested range.
pub async fn search<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Query(query): Query<SearchQuery>,
) -> Result<Json<AvailabilityListResponse>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    require_principal(&cookies, state.as_ref())?;

    let (Some(start), Some(end)) = (query.start, query.end) else {
        return Err(ServerError::MissingFields);
    };
    let window = TimeWindow::new(start, end)?;

    let availability = state.ledger.find_available_doctors(&window)?;

    Ok(Json(AvailabilityListResponse {
        success: true,
        availability,
    }))
}

/// DELETE /api/availability/{id}
pub async fn withdraw<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let principal = require_principal(&cookies, state.as_ref())?;

    state
        .coordinator()
        .withdraw_availability(&principal, AvailabilityId(id))?;

    Ok(Json(DeleteResponse { success: true }))
}
