//! Sign-up, login and logout endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use mediq_core::Principal;
use serde::Serialize;
use tower_cookies::Cookies;

use crate::error::ServerError;
use crate::identity::{authenticate, sign_up, Credentials, SignUpForm};
use crate::state::AppState;
use crate::store::{BookingLedger, PublicUser, SessionId, SessionStore, UserStore};

use super::session::{clear_session_cookie, set_session_cookie, SESSION_COOKIE};

#[derive(Serialize)]
pub struct SignUpResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// POST /api/auth/signup
pub async fn signup<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    Json(form): Json<SignUpForm>,
) -> Result<(StatusCode, Json<SignUpResponse>), ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let user = sign_up(state.user_store.as_ref(), form, state.bcrypt_cost)?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            success: true,
            user,
        }),
    ))
}

#[derive(Serialize)]
pub struct AuthenticateResponse {
    pub success: bool,
    pub principal: Principal,
}

/// POST /api/auth/authenticate
pub async fn authenticate_user<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthenticateResponse>, ServerError>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    let Some(principal) = authenticate(state.user_store.as_ref(), &credentials)? else {
        tracing::debug!("Authentication rejected");
        return Err(ServerError::InvalidCredentials);
    };

    let session = state.session_store.create(principal.id)?;
    set_session_cookie(&cookies, &session.id.0);

    tracing::info!(user_id = %principal.id, role = %principal.role(), "User authenticated");
    Ok(Json(AuthenticateResponse {
        success: true,
        principal,
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/auth/logout
pub async fn logout<U, B, S>(
    State(state): State<Arc<AppState<U, B, S>>>,
    cookies: Cookies,
) -> Json<LogoutResponse>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let session_id = SessionId(cookie.value().to_string());
        if let Err(e) = state.session_store.delete(&session_id) {
            tracing::warn!(error = %e, "Failed to delete session on logout");
        }
    }

    clear_session_cookie(&cookies);

    Json(LogoutResponse { success: true })
}
