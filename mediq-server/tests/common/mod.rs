//! Common test utilities for server integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use cookie::Cookie;
use mediq_server::{
    routes, AppState, InMemoryScheduleStore, InMemorySessionStore, InMemoryUserStore,
};
use serde_json::{json, Value};

pub const PASSWORD: &str = "password123";
pub const SESSION_COOKIE: &str = "mediq_session";

/// Cheapest bcrypt cost so tests stay fast
pub const TEST_BCRYPT_COST: u32 = 4;

/// Create a test server over in-memory stores
pub fn create_test_server() -> TestServer {
    let state = AppState::new(
        InMemoryUserStore::new(),
        InMemoryScheduleStore::new(),
        InMemorySessionStore::new(),
    )
    .with_bcrypt_cost(TEST_BCRYPT_COST);

    let app = routes::create_router(Arc::new(state), Duration::from_secs(10));
    TestServer::new(app).expect("Failed to create test server")
}

pub fn session_cookie(value: &str) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, value.to_string())
}

/// Sign up a user and return the `user` object from the response
pub async fn sign_up(
    server: &TestServer,
    email: &str,
    name: &str,
    role: &str,
    specialty: Option<&str>,
) -> Value {
    let response = server
        .post("/api/auth/signup")
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "name": name,
            "role": role,
            "specialty": specialty,
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    body["user"].clone()
}

/// Log in with the shared test password and return the session cookie value
pub async fn login(server: &TestServer, email: &str, role: &str) -> String {
    let response = server
        .post("/api/auth/authenticate")
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "role": role,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

/// A logged-in participant: user id and session cookie value
pub struct Party {
    pub id: u64,
    pub session: String,
}

impl Party {
    pub fn cookie(&self) -> Cookie<'static> {
        session_cookie(&self.session)
    }
}

pub async fn doctor(server: &TestServer, email: &str, name: &str, specialty: &str) -> Party {
    let user = sign_up(server, email, name, "doctor", Some(specialty)).await;
    Party {
        id: user["id"].as_u64().expect("doctor id"),
        session: login(server, email, "doctor").await,
    }
}

pub async fn patient(server: &TestServer, email: &str, name: &str) -> Party {
    let user = sign_up(server, email, name, "patient", None).await;
    Party {
        id: user["id"].as_u64().expect("patient id"),
        session: login(server, email, "patient").await,
    }
}

/// Publish a window as `doctor` and return its id
pub async fn publish(server: &TestServer, doctor: &Party, start: &str, end: &str) -> u64 {
    let response = server
        .post("/api/availability")
        .add_cookie(doctor.cookie())
        .json(&json!({ "start": start, "end": end }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    body["availability"]["id"].as_u64().expect("availability id")
}
