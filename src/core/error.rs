// src/core/error.rs

use crate::core::models::TaskState;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy of the task and query surface.
///
/// Validation failures are raised before any registry or store mutation;
/// `Transient` covers request-level failures that the next poll or user
/// action is expected to retry (no layer retries automatically).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid task transition: {from} -> {to}")]
    InvalidTransition { from: TaskState, to: TaskState },

    #[error("transient failure: {0}")]
    Transient(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::UnknownTask(_) | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            Error::Transient(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

// The wire contract reports failure through the body's status field, so the
// presenter can treat any non-success status uniformly; the HTTP status code
// carries the same information for plain HTTP clients.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "fail",
            "msg": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
