use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Input rejected before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("phone must have at least {min} digits, got {digits}")]
    PhoneTooShort { digits: usize, min: usize },

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("no valid contacts found in {total_rows} row(s)")]
    NoValidRows { total_rows: usize },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("contact {0} not found")]
    NotFound(Uuid),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Anything that stops a message from being rendered into a link. Always
/// collapsed into contact status `error`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to load message template: {0}")]
    Template(#[source] PersistenceError),

    #[error("invalid phone: {0}")]
    Phone(#[from] ValidationError),

    #[error("invalid link: {0}")]
    Link(#[from] url::ParseError),

    #[error("failed to record sent status: {0}")]
    Record(#[source] PersistenceError),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("failed to read CSV: {0}")]
    Csv(csv::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Csv(e) => Self::Csv(e),
            ImportError::Validation(e) => Self::Validation(e),
            ImportError::Persistence(e) => Self::Persistence(e),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(ValidationError::NoValidRows { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Validation(_) | Self::Csv(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(PersistenceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Dispatch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
