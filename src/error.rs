use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("booking_end must be after booking_start")]
    InvalidWindow,

    #[error("job was already claimed by another cleaner")]
    AlreadyClaimed,

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("job has already been rated")]
    AlreadyRated,

    #[error("stars must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("unknown checklist item {0}")]
    InvalidChecklistItem(u64),

    #[error("email is already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("unknown role: {0}")]
    InvalidRole(String),

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable kind, surfaced verbatim in error bodies so
    /// callers can branch (e.g. retry a different job after `already_claimed`).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unauthenticated(_) => "unauthenticated",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::InvalidWindow => "invalid_window",
            Error::AlreadyClaimed => "already_claimed",
            Error::InvalidTransition(_) => "invalid_transition",
            Error::AlreadyRated => "already_rated",
            Error::InvalidRating(_) => "invalid_rating",
            Error::InvalidChecklistItem(_) => "invalid_checklist_item",
            Error::EmailTaken => "email_taken",
            Error::InvalidCredentials => "invalid_credentials",
            Error::InvalidRole(_) => "invalid_role",
            Error::WeakPassword(_) => "weak_password",
            Error::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyClaimed
            | Error::InvalidTransition(_)
            | Error::AlreadyRated
            | Error::EmailTaken => StatusCode::CONFLICT,
            Error::InvalidWindow
            | Error::InvalidRating(_)
            | Error::InvalidChecklistItem(_)
            | Error::InvalidRole(_)
            | Error::WeakPassword(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "error": self.kind(),
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}
