//! Session endpoint and cookie helpers

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use mediq_core::Principal;
use serde::Serialize;
use tower_cookies::{Cookie, Cookies};

use crate::error::ServerError;
use crate::state::AppState;
use crate::store::{BookingLedger, SessionId, SessionStore, StoreResult, UserStore};

pub const SESSION_COOKIE: &str = "mediq_session";

#[derive(Serialize)]
pub struct SessionContext {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub server_time: i64,
}

/// GET /api/auth/session
pub async fn get_session<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
) -> Result<Json<SessionContext>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let principal = current_principal(&cookies, state.as_ref())?;

    Ok(Json(SessionContext {
        authenticated: principal.is_some(),
        principal,
        server_time: chrono::Utc::now().timestamp(),
    }))
}

/// Resolve the caller from the session cookie.
///
/// The principal is rebuilt from the stored user on every request, so a
/// session never carries a stale role or specialty.
pub fn current_principal<U, B, S>(
    cookies: &Cookies,
    state: &AppState<U, B, S>,
) -> StoreResult<Option<Principal>>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let Some(cookie) = cookies.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let session_id = SessionId(cookie.value().to_string());

    let Some(session) = state.session_store.get(&session_id)? else {
        return Ok(None);
    };

    Ok(state
        .user_store
        .find_by_id(session.user_id)?
        .map(|user| user.principal()))
}

/// Like [`current_principal`] but fails with `NotAuthenticated`
pub fn require_principal<U, B, S>(
    cookies: &Cookies,
    state: &AppState<U, B, S>,
) -> Result<Principal, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    current_principal(cookies, state)?.ok_or(ServerError::NotAuthenticated)
}

pub fn set_session_cookie(cookies: &Cookies, session_id: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
