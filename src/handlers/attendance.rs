use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::attendance::AttendanceStatus;
use crate::models::class_schedule::Turn;
use crate::services::absence_scheduler;
use crate::services::attendance_service::{self, Campus, HistoryFilter};
use crate::utils::config::Config;
use crate::utils::turns;

use super::map_service_error;

#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub turno: Option<Turn>,
    pub date: Option<chrono::NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

fn caller_id(claims: &crate::middleware::auth::Claims) -> Result<Uuid, actix_web::Error> {
    Uuid::parse_str(&claims.sub)
        .map_err(|e| actix_web::error::ErrorBadRequest(format!("Invalid user ID: {}", e)))
}

/// POST /api/register-by-turn
/// Teacher check-in for the currently active turn
pub async fn register_by_turn(
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    user_claims: web::ReqData<crate::middleware::auth::Claims>,
    payload: web::Json<CheckinRequest>,
) -> Result<impl Responder, actix_web::Error> {
    if !user_claims.role.can_register_attendance() {
        return Err(actix_web::error::ErrorForbidden(
            "Only teachers can register attendance",
        ));
    }
    let teacher_id = caller_id(&user_claims)?;

    let campus = Campus {
        latitude: config.campus_latitude,
        longitude: config.campus_longitude,
        radius_meters: config.campus_radius_meters,
    };
    let now_local = turns::to_local(Utc::now(), config.utc_offset_hours);

    let outcome = attendance_service::register_by_turn(
        db.as_ref(),
        &campus,
        teacher_id,
        payload.latitude,
        payload.longitude,
        now_local,
    )
    .await
    .map_err(map_service_error)?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /api/register-by-turn
/// The caller's own attendance history
pub async fn attendance_history(
    db: web::Data<DatabaseConnection>,
    user_claims: web::ReqData<crate::middleware::auth::Claims>,
    query: web::Query<HistoryQuery>,
) -> Result<impl Responder, actix_web::Error> {
    if !user_claims.role.can_register_attendance() {
        return Err(actix_web::error::ErrorForbidden(
            "Only teachers can query their attendance",
        ));
    }
    let teacher_id = caller_id(&user_claims)?;

    let filter = HistoryFilter {
        turn: query.turno,
        date: query.date,
        status: query.status,
    };

    let entries = attendance_service::attendance_history(db.as_ref(), teacher_id, filter)
        .await
        .map_err(map_service_error)?;

    Ok(HttpResponse::Ok().json(entries))
}

/// POST /api/attendance/auto-absence
/// Manually trigger the auto-absence run for the current turn
pub async fn trigger_auto_absence(
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    user_claims: web::ReqData<crate::middleware::auth::Claims>,
) -> Result<impl Responder, actix_web::Error> {
    if !user_claims.role.can_trigger_absence_run() {
        return Err(actix_web::error::ErrorForbidden(
            "Only coordinators can trigger the absence run",
        ));
    }

    let now_local = turns::to_local(Utc::now(), config.utc_offset_hours);
    let Some(turn) = turns::turn_of(now_local.time()) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "No turn is active right now"
        })));
    };
    let date = now_local.date();

    let summary = absence_scheduler::run_auto_absence(db.as_ref(), date, turn)
        .await
        .map_err(|e| {
            log::error!("Auto-absence trigger failed for {} {}: {}", date, turn.as_str(), e);
            map_service_error(e)
        })?;

    Ok(HttpResponse::Ok().json(summary))
}
