//! Booking flow tests

mod common;

use axum_test::TestServer;
use common::{create_test_server, doctor, patient, publish, Party};
use serde_json::{json, Value};

async fn book(
    server: &TestServer,
    patient: &Party,
    doctor_id: u64,
    start: &str,
    end: &str,
) -> axum_test::TestResponse {
    server
        .post("/api/appointments")
        .add_cookie(patient.cookie())
        .json(&json!({
            "doctor_id": doctor_id,
            "start": start,
            "end": end,
            "reason": "Regular checkup",
        }))
        .await
}

async fn setup() -> (TestServer, Party, Party) {
    let server = create_test_server();
    let smith = doctor(&server, "smith@example.com", "Dr. John Smith", "Cardiology").await;
    let jane = patient(&server, "jane@example.com", "Jane Doe").await;
    publish(&server, &smith, "2024-01-15T09:00:00Z", "2024-01-15T17:00:00Z").await;
    (server, smith, jane)
}

#[tokio::test]
async fn test_booking_inside_window() {
    let (server, smith, jane) = setup().await;

    let response = book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;

    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    let appointment = &body["appointment"];
    assert_eq!(appointment["status"], "scheduled");
    assert_eq!(appointment["doctor_id"], smith.id);
    assert_eq!(appointment["patient_id"], jane.id);
    assert_eq!(appointment["doctor_name"], "Dr. John Smith");
    assert_eq!(appointment["patient_name"], "Jane Doe");
    assert_eq!(appointment["specialty"], "Cardiology");
    assert_eq!(appointment["reason"], "Regular checkup");
}

#[tokio::test]
async fn test_booking_outside_window() {
    let (server, smith, jane) = setup().await;

    let response = book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T18:00:00Z",
        "2024-01-15T19:00:00Z",
    )
    .await;

    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["reason"], "Requested slot is not available");

    let body: Value = server
        .get("/api/appointments")
        .add_cookie(jane.cookie())
        .await
        .json();
    assert!(body["appointments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_straddling_window_edge() {
    let (server, smith, jane) = setup().await;

    let response = book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T16:30:00Z",
        "2024-01-15T17:30:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_booked_time_cannot_be_sold_twice() {
    let (server, smith, jane) = setup().await;
    let john = patient(&server, "john@example.com", "John Roe").await;

    let response = book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 201);

    let response = book(
        &server,
        &john,
        smith.id,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 409);

    let response = book(
        &server,
        &john,
        smith.id,
        "2024-01-15T10:30:00Z",
        "2024-01-15T11:30:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 409);

    // What is left on either side stays bookable
    let response = book(
        &server,
        &john,
        smith.id,
        "2024-01-15T09:00:00Z",
        "2024-01-15T10:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 201);

    let response = book(
        &server,
        &john,
        smith.id,
        "2024-01-15T11:00:00Z",
        "2024-01-15T17:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 201);
}

#[tokio::test]
async fn test_booking_splits_availability() {
    let (server, smith, jane) = setup().await;

    book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;

    let body: Value = server
        .get("/api/availability")
        .add_cookie(smith.cookie())
        .await
        .json();
    let windows: Vec<(String, String)> = body["availability"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["start"].as_str().unwrap().to_string(),
                a["end"].as_str().unwrap().to_string(),
            )
        })
        .collect();

    assert_eq!(
        windows,
        vec![
            (
                "2024-01-15T09:00:00Z".to_string(),
                "2024-01-15T10:00:00Z".to_string()
            ),
            (
                "2024-01-15T11:00:00Z".to_string(),
                "2024-01-15T17:00:00Z".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn test_booking_validation() {
    let (server, smith, jane) = setup().await;

    // Inverted range
    let response = book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T11:00:00Z",
        "2024-01-15T10:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 400);

    // Unknown doctor
    let response = book(
        &server,
        &jane,
        9999,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 404);

    // A patient id is not a doctor
    let response = book(
        &server,
        &jane,
        jane.id,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 404);

    // Doctors do not book
    let response = book(
        &server,
        &smith,
        smith.id,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_appointments_listed_for_both_parties() {
    let (server, smith, jane) = setup().await;

    book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T14:00:00Z",
        "2024-01-15T15:00:00Z",
    )
    .await;
    book(
        &server,
        &jane,
        smith.id,
        "2024-01-15T10:00:00Z",
        "2024-01-15T11:00:00Z",
    )
    .await;

    for party in [&smith, &jane] {
        let body: Value = server
            .get("/api/appointments")
            .add_cookie(party.cookie())
            .await
            .json();
        let starts: Vec<&str> = body["appointments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["start"].as_str().unwrap())
            .collect();
        assert_eq!(starts, vec!["2024-01-15T10:00:00Z", "2024-01-15T14:00:00Z"]);
    }
}
