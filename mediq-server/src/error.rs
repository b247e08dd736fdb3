//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid role. Must be patient or doctor")]
    InvalidRole,

    #[error("Specialty is required for doctors")]
    MissingSpecialty,

    #[error("User with this email already exists")]
    DuplicateIdentity,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not allowed")]
    Forbidden,

    #[error("End time must be after start time")]
    InvalidRange,

    #[error("Requested slot is not available")]
    SlotUnavailable,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<mediq_core::Error> for ServerError {
    fn from(err: mediq_core::Error) -> Self {
        use mediq_core::Error as CoreError;

        match err {
            CoreError::InvalidRange { .. } => ServerError::InvalidRange,
            CoreError::InvalidRole(_) => ServerError::InvalidRole,
            CoreError::MissingSpecialty => ServerError::MissingSpecialty,
            CoreError::InvalidStatus(status) => {
                ServerError::ValidationError(format!("unknown status: {}", status))
            }
            CoreError::InvalidTransition { from, to } => ServerError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(err: rusqlite::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, message) = match &self {
            ServerError::MissingFields
            | ServerError::InvalidRole
            | ServerError::MissingSpecialty
            | ServerError::DuplicateIdentity
            | ServerError::InvalidRange => (StatusCode::BAD_REQUEST, message),
            ServerError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::InvalidCredentials | ServerError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, message)
            }
            ServerError::Forbidden => (StatusCode::FORBIDDEN, message),
            ServerError::SlotUnavailable | ServerError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, message)
            }
            ServerError::DoctorNotFound
            | ServerError::PatientNotFound
            | ServerError::AppointmentNotFound => (StatusCode::NOT_FOUND, message),
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
