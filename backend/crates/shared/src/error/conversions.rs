//! Error conversions
//!
//! Maps store and framework errors onto `AppError`.

#[cfg(any(feature = "sqlx", feature = "axum"))]
use super::app_error::AppError;
#[cfg(any(feature = "sqlx", test))]
use super::kind::ErrorKind;

/// Classify a PostgreSQL SQLSTATE code.
///
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
#[cfg(any(feature = "sqlx", test))]
fn classify_sqlstate(code: &str) -> (ErrorKind, &'static str) {
    match code {
        // Class 23: Integrity Constraint Violation
        "23503" => (ErrorKind::Conflict, "Foreign key violation"),
        "23505" => (ErrorKind::Conflict, "Duplicate key value"),
        "23514" => (ErrorKind::BadRequest, "Check constraint violation"),
        // Class 40: Transaction Rollback (serialization failure, deadlock)
        "40001" | "40P01" => (ErrorKind::ServiceUnavailable, "Transaction aborted, retry"),
        // Class 53: Insufficient Resources
        "53000" | "53100" | "53200" | "53300" => {
            (ErrorKind::ServiceUnavailable, "Database resource exhausted")
        }
        // Class 57: Operator Intervention
        "57000" | "57014" | "57P01" | "57P02" | "57P03" => {
            (ErrorKind::ServiceUnavailable, "Database unavailable")
        }
        _ => (ErrorKind::InternalServerError, "Database error"),
    }
}

/// Classify a sqlx error without consuming it.
#[cfg(feature = "sqlx")]
pub fn classify_sqlx(err: &sqlx::Error) -> (ErrorKind, &'static str) {
    match err {
        sqlx::Error::RowNotFound => (ErrorKind::NotFound, "Record not found"),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            (ErrorKind::ServiceUnavailable, "Database connection unavailable")
        }
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| classify_sqlstate(&code))
            .unwrap_or((ErrorKind::InternalServerError, "Database error")),
        _ => (ErrorKind::InternalServerError, "Database error"),
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let (kind, message) = classify_sqlx(&err);
        AppError::new(kind, message).with_source(err)
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}
