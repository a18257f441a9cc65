//! Quiz Error Types
//!
//! Quiz-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::classify_sqlx, kind::ErrorKind};
use kernel::id::{QuestionId, UserId};
use thiserror::Error;

/// Quiz-specific result type alias
pub type QuizResult<T> = Result<T, QuizError>;

/// Quiz-specific error variants
#[derive(Debug, Error)]
pub enum QuizError {
    /// No question has ever been activated
    #[error("No question is currently active")]
    NoCurrentQuestion,

    /// Every question has already been started; the catalog needs new questions
    #[error("No unstarted questions remain")]
    Exhausted,

    /// Submitted answer is not one of the question's choices
    #[error("Invalid answer choice: {0}")]
    InvalidChoice(String),

    #[error("Question not found: {0}")]
    QuestionNotFound(QuestionId),

    #[error("Player not found: {0}")]
    PlayerNotFound(UserId),

    /// Activation attempted on a question that already ran
    #[error("Question already started: {0}")]
    AlreadyStarted(QuestionId),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-SQL store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// A rotation step failed and the transaction was rolled back
    #[error("Rotation failed: {0}")]
    Rotation(#[source] Box<QuizError>),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuizError {
    /// Wrap a failure raised during a rotation
    pub fn rotation(cause: QuizError) -> Self {
        match cause {
            already @ QuizError::Rotation(_) => already,
            other => QuizError::Rotation(Box::new(other)),
        }
    }

    /// The underlying error, looking through a rotation wrapper
    pub fn cause(&self) -> &QuizError {
        match self {
            QuizError::Rotation(inner) => inner.cause(),
            other => other,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuizError::NoCurrentQuestion
            | QuizError::QuestionNotFound(_)
            | QuizError::PlayerNotFound(_) => ErrorKind::NotFound,
            QuizError::Exhausted | QuizError::AlreadyStarted(_) => ErrorKind::Conflict,
            QuizError::InvalidChoice(_) => ErrorKind::UnprocessableEntity,
            QuizError::Database(e) => classify_sqlx(e).0,
            QuizError::Storage(_) => ErrorKind::ServiceUnavailable,
            QuizError::Rotation(inner) => inner.kind(),
            QuizError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Whether the caller may retry the same operation unchanged
    pub fn is_retryable(&self) -> bool {
        match self.cause() {
            QuizError::Exhausted | QuizError::AlreadyStarted(_) => false,
            other => other.kind().is_retryable(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self.cause() {
            QuizError::NoCurrentQuestion => err.with_action("Wait for the next question"),
            QuizError::Exhausted => err.with_action("Add new questions to the catalog"),
            QuizError::InvalidChoice(_) => err.with_action("Pick one of the listed answers"),
            _ if self.is_retryable() => err.with_action("Retry the request"),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            QuizError::Database(e) => {
                tracing::error!(error = %e, "Quiz database error");
            }
            QuizError::Storage(msg) => {
                tracing::error!(message = %msg, "Quiz storage error");
            }
            QuizError::Internal(msg) => {
                tracing::error!(message = %msg, "Quiz internal error");
            }
            QuizError::Rotation(inner) => {
                tracing::warn!(cause = %inner, "Quiz rotation rolled back");
            }
            QuizError::Exhausted => {
                tracing::warn!("Question catalog exhausted");
            }
            _ => {
                tracing::debug!(error = %self, "Quiz error");
            }
        }
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
