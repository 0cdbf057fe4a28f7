use axum::response::{IntoResponse, Response};
use ::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::error::TaskError;

/// Body of every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError { pub error: String }

/// Body of a successful delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage { pub message: String }

impl ApiMessage {
    pub fn task_deleted() -> Self { Self { message: "Tarefa excluída com sucesso".into() } }
}

impl TaskError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TaskError::Validation(_) => StatusCode::BAD_REQUEST,
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            // The cause stays in the log; the client only gets the generic message.
            TaskError::Internal(cause) => tracing::error!(error = ?cause, "request failed"),
            TaskError::NotFound(id) => tracing::debug!(%id, "task not found"),
            TaskError::Validation(err) => tracing::debug!(%err, "request rejected"),
        }
        (status, axum::Json(ApiError { error: self.to_string() })).into_response()
    }
}
