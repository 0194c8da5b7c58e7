//! HTTP-facing error type (spec §6.1 "Exit codes / HTTP", §7). Wraps the
//! pipeline/core error taxonomy into the four status codes the HTTP surface
//! promises: 400 validation, 404 unknown entities, 409 non-current-session
//! writes, 5xx unhandled system errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use drivethru_core::error::CoreError;
use drivethru_pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl From<CoreError> for ServerError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::SessionNotFound(_) => ServerError::NotFound(e.to_string()),
            CoreError::NotCurrentSession(_) => ServerError::Conflict(e.to_string()),
            CoreError::MenuItemNotFound(_) | CoreError::LineItemNotFound(_) => ServerError::NotFound(e.to_string()),
            CoreError::Database(_) | CoreError::ExternalService(_) | CoreError::Serialization(_) | CoreError::Internal(_) => {
                ServerError::Internal(e.to_string())
            }
        }
    }
}

impl From<PipelineError> for ServerError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::SessionBusy(_) => ServerError::Conflict(e.to_string()),
            PipelineError::TurnTimedOut => ServerError::Internal(e.to_string()),
            PipelineError::Core(core) => core.into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "unhandled system error");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
