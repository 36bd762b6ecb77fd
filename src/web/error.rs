//! Error bridge between the todo store and HTTP responses.
//!
//! Clients only ever see a bare 500; the cause goes to the log.

use axum::{
    extract::rejection::{FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio::task::JoinError;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("store task did not complete: {0}")]
    Task(#[from] JoinError),
    #[error("bad todo id: {0}")]
    Path(#[from] PathRejection),
    #[error("bad todo form: {0}")]
    Form(#[from] FormRejection),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match &self {
            WebError::Store(StoreError::NotFound(id)) => {
                tracing::warn!(id, error = %self, "request for missing todo");
            }
            WebError::Path(_) | WebError::Form(_) => {
                tracing::warn!(error = %self, "rejected malformed request");
            }
            _ => tracing::error!(error = %self, "request failed"),
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "fail").into_response()
    }
}
