//! User lookup endpoint

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use mediq_core::UserId;
use serde::Serialize;
use tower_cookies::Cookies;

use crate::error::ServerError;
use crate::state::AppState;
use crate::store::{BookingLedger, PublicUser, SessionStore, UserStore};

use super::session::require_principal;

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: Option<PublicUser>,
}

/// GET /api/users/{id}
pub async fn get_user<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
) -> Result<Json<UserResponse>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    require_principal(&cookies, state.as_ref())?;

    let user = state.user_store.find_by_id(UserId(id))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}
