use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::CampaignStatus;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Volunteer is already registered for this campaign")]
    DuplicateRegistration,

    #[error("Campaign does not accept registrations in status {0}")]
    InvalidCampaignState(CampaignStatus),

    #[error("Registration window is closed, the campaign has already started")]
    RegistrationWindowClosed,

    #[error("Campaign is full")]
    CampaignFull,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// True when the failure left no trace in the store and the same call may be retried.
    /// Business rejections are final for the given input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized => "unauthorized",
            AppError::DuplicateRegistration => "duplicate_registration",
            AppError::InvalidCampaignState(_) => "invalid_campaign_state",
            AppError::RegistrationWindowClosed => "registration_window_closed",
            AppError::CampaignFull => "campaign_full",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::Database(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::DuplicateRegistration
            | AppError::InvalidCampaignState(_)
            | AppError::RegistrationWindowClosed
            | AppError::CampaignFull
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database_error");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": self.code(),
            "message": message,
            "retryable": self.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

/// Unique-index violations surface from SQLite as a plain database error.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
