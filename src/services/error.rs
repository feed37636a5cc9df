use sea_orm::DbErr;
use thiserror::Error;

/// Failure taxonomy of the schedule/attendance services. Handlers map the
/// variants onto 400/404/409/403/500 responses; every variant carries the
/// human-readable reason sent to the client.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}
