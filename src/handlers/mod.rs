pub mod attendance;
pub mod auth;
pub mod class_schedules;

use crate::services::error::ServiceError;

/// Map the service failure taxonomy onto HTTP statuses.
pub(crate) fn map_service_error(e: ServiceError) -> actix_web::Error {
    match e {
        ServiceError::Validation(msg) => actix_web::error::ErrorBadRequest(msg),
        ServiceError::NotFound(msg) => actix_web::error::ErrorNotFound(msg),
        ServiceError::Conflict(msg) => actix_web::error::ErrorConflict(msg),
        ServiceError::Forbidden(msg) => actix_web::error::ErrorForbidden(msg),
        ServiceError::Db(e) => {
            log::error!("Database error: {}", e);
            actix_web::error::ErrorInternalServerError("Database error")
        }
    }
}
