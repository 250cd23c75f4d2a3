use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorBody;

/// Failures of a chat turn, each mapped to an HTTP status with a `detail` body.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Empty message")]
    EmptyMessage,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("No assistant reply found")]
    NoAssistantReply,

    #[error("Error from Letta: {0}")]
    Upstream(anyhow::Error),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
            ChatError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::NoAssistantReply | ChatError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Chat request failed: {}", self);
        } else {
            warn!("Chat request rejected: {}", self);
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
