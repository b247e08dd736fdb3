//! HTTP routes for the booking service

mod appointments;
mod auth;
mod availability;
pub mod session;
mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::{BookingLedger, SessionStore, UserStore};

/// Create the router with all routes
pub fn create_router<U, B, S>(state: Arc<AppState<U, B, S>>, request_timeout: Duration) -> Router
where
    U: UserStore + 'static,
    B: BookingLedger + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/authenticate", post(auth::authenticate_user))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(session::get_session))
        .route("/api/users/{id}", get(users::get_user))
        .route(
            "/api/availability",
            post(availability::publish).get(availability::list_by_doctor),
        )
        .route("/api/availability/search", get(availability::search))
        .route("/api/availability/{id}", delete(availability::withdraw))
        .route(
            "/api/appointments",
            post(appointments::book).get(appointments::list_mine),
        )
        .route("/api/appointments/{id}/status", post(appointments::update_status))
        .layer(CookieManagerLayer::new())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}
