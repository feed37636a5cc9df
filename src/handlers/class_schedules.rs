use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::class_schedule::{self, Turn};
use crate::models::class_schedule_detail::Weekday;
use crate::models::{calendar, course, school_class};
use crate::services::conflict_checker::ProposedSlot;
use crate::services::schedule_service::{self, Actor, DetailGraph, NewSchedule, ScheduleGraph};

use super::map_service_error;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDetailRequest {
    pub discipline_id: Uuid,
    pub hour_id: Uuid,
    pub day_of_week: Weekday,
    pub user_id: Option<Uuid>,
}

impl ScheduleDetailRequest {
    fn to_slot(&self) -> ProposedSlot {
        ProposedSlot {
            discipline_id: self.discipline_id,
            hour_id: self.hour_id,
            day_of_week: self.day_of_week,
            user_id: self.user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub calendar_id: Uuid,
    pub class_id: Uuid,
    pub turn: Turn,
    pub details: Vec<ScheduleDetailRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub details: Vec<ScheduleDetailRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFilterQuery {
    pub calendar_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub turn: Option<Turn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub id: Uuid,
    pub year: i32,
    pub period: i16,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
}

impl From<calendar::Model> for CalendarSummary {
    fn from(model: calendar::Model) -> Self {
        Self {
            id: model.id,
            year: model.year,
            period: model.period,
            start_date: model.start_date,
            end_date: model.end_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourSummary {
    pub id: Uuid,
    pub hour_start: String,
    pub hour_end: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    pub id: Uuid,
    pub day_of_week: Weekday,
    pub hour: HourSummary,
    pub discipline: NamedRef,
    pub teacher: Option<NamedRef>,
}

impl From<DetailGraph> for DetailResponse {
    fn from(graph: DetailGraph) -> Self {
        Self {
            id: graph.detail.id,
            day_of_week: graph.detail.day_of_week,
            hour: HourSummary {
                id: graph.hour.id,
                hour_start: graph.hour.hour_start.format("%H:%M:%S").to_string(),
                hour_end: graph.hour.hour_end.format("%H:%M:%S").to_string(),
            },
            discipline: NamedRef {
                id: graph.discipline.id,
                name: graph.discipline.name,
            },
            teacher: graph.teacher.map(|t| NamedRef {
                id: t.id,
                name: t.name,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub turn: Turn,
    pub is_active: bool,
    pub calendar: CalendarSummary,
    pub school_class: NamedRef,
    pub course: NamedRef,
    pub details: Vec<DetailResponse>,
}

impl From<ScheduleGraph> for ScheduleResponse {
    fn from(graph: ScheduleGraph) -> Self {
        Self {
            id: graph.schedule.id,
            turn: graph.schedule.turn,
            is_active: graph.schedule.is_active,
            calendar: graph.calendar.into(),
            school_class: NamedRef {
                id: graph.school_class.id,
                name: graph.school_class.name,
            },
            course: NamedRef {
                id: graph.course.id,
                name: graph.course.name,
            },
            details: graph.details.into_iter().map(DetailResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub id: Uuid,
    pub turn: Turn,
    pub is_active: bool,
    pub calendar: Option<CalendarSummary>,
    pub school_class: Option<NamedRef>,
    pub course: Option<NamedRef>,
}

fn actor_from(claims: &crate::middleware::auth::Claims) -> Result<Actor, actix_web::Error> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|e| actix_web::error::ErrorBadRequest(format!("Invalid user ID: {}", e)))?;

    Ok(Actor {
        user_id,
        role: claims.role,
    })
}

/// POST /api/class-schedules
/// Create a schedule with its full detail grid
pub async fn create_schedule(
    db: web::Data<DatabaseConnection>,
    user_claims: web::ReqData<crate::middleware::auth::Claims>,
    payload: web::Json<CreateScheduleRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let actor = actor_from(&user_claims)?;
    if !actor.role.can_manage_schedules() {
        return Err(actix_web::error::ErrorForbidden(
            "Only coordinators can manage schedules",
        ));
    }

    let input = NewSchedule {
        calendar_id: payload.calendar_id,
        school_class_id: payload.class_id,
        turn: payload.turn,
        details: payload.details.iter().map(ScheduleDetailRequest::to_slot).collect(),
    };

    let graph = schedule_service::create_schedule(db.as_ref(), &actor, input)
        .await
        .map_err(map_service_error)?;

    Ok(HttpResponse::Created().json(ScheduleResponse::from(graph)))
}

/// PUT /api/class-schedule/:id
/// Replace a schedule's details wholesale
pub async fn update_schedule(
    db: web::Data<DatabaseConnection>,
    user_claims: web::ReqData<crate::middleware::auth::Claims>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateScheduleRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let actor = actor_from(&user_claims)?;
    if !actor.role.can_manage_schedules() {
        return Err(actix_web::error::ErrorForbidden(
            "Only coordinators can manage schedules",
        ));
    }

    let schedule_id = path.into_inner();
    let details = payload
        .details
        .iter()
        .map(ScheduleDetailRequest::to_slot)
        .collect();

    let graph = schedule_service::replace_schedule_details(db.as_ref(), &actor, schedule_id, details)
        .await
        .map_err(map_service_error)?;

    Ok(HttpResponse::Ok().json(ScheduleResponse::from(graph)))
}

/// GET /api/class-schedules
pub async fn list_schedules(
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, actix_web::Error> {
    let schedules = class_schedule::Entity::find()
        .all(db.as_ref())
        .await
        .map_err(|e| {
            log::error!("Database error: {}", e);
            actix_web::error::ErrorInternalServerError("Database error")
        })?;

    let summaries = summarize(db.as_ref(), schedules).await?;
    Ok(HttpResponse::Ok().json(summaries))
}

/// GET /api/class-schedules/filter
pub async fn filter_schedules(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ScheduleFilterQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let mut schedules_query = class_schedule::Entity::find();

    if let Some(calendar_id) = query.calendar_id {
        schedules_query =
            schedules_query.filter(class_schedule::Column::CalendarId.eq(calendar_id));
    }
    if let Some(class_id) = query.class_id {
        schedules_query =
            schedules_query.filter(class_schedule::Column::SchoolClassId.eq(class_id));
    }
    if let Some(course_id) = query.course_id {
        schedules_query = schedules_query.filter(class_schedule::Column::CourseId.eq(course_id));
    }
    if let Some(turn) = query.turn {
        schedules_query = schedules_query.filter(class_schedule::Column::Turn.eq(turn));
    }

    let schedules = schedules_query.all(db.as_ref()).await.map_err(|e| {
        log::error!("Database error: {}", e);
        actix_web::error::ErrorInternalServerError("Database error")
    })?;

    let summaries = summarize(db.as_ref(), schedules).await?;
    Ok(HttpResponse::Ok().json(summaries))
}

/// GET /api/class-schedules/:id/details
pub async fn schedule_details(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, actix_web::Error> {
    let graph = schedule_service::load_schedule_graph(db.as_ref(), path.into_inner())
        .await
        .map_err(map_service_error)?;

    let details: Vec<DetailResponse> = graph.details.into_iter().map(DetailResponse::from).collect();
    Ok(HttpResponse::Ok().json(details))
}

async fn summarize(
    db: &DatabaseConnection,
    schedules: Vec<class_schedule::Model>,
) -> Result<Vec<ScheduleSummary>, actix_web::Error> {
    let db_error = |e: DbErr| {
        log::error!("Database error: {}", e);
        actix_web::error::ErrorInternalServerError("Database error")
    };

    let calendar_ids: Vec<Uuid> = schedules.iter().map(|s| s.calendar_id).collect();
    let class_ids: Vec<Uuid> = schedules.iter().map(|s| s.school_class_id).collect();
    let course_ids: Vec<Uuid> = schedules.iter().map(|s| s.course_id).collect();

    let calendars: HashMap<Uuid, calendar::Model> = calendar::Entity::find()
        .filter(calendar::Column::Id.is_in(calendar_ids))
        .all(db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let classes: HashMap<Uuid, school_class::Model> = school_class::Entity::find()
        .filter(school_class::Column::Id.is_in(class_ids))
        .all(db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let courses: HashMap<Uuid, course::Model> = course::Entity::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let summaries = schedules
        .into_iter()
        .map(|schedule| ScheduleSummary {
            id: schedule.id,
            turn: schedule.turn,
            is_active: schedule.is_active,
            calendar: calendars
                .get(&schedule.calendar_id)
                .cloned()
                .map(CalendarSummary::from),
            school_class: classes.get(&schedule.school_class_id).map(|c| NamedRef {
                id: c.id,
                name: c.name.clone(),
            }),
            course: courses.get(&schedule.course_id).map(|c| NamedRef {
                id: c.id,
                name: c.name.clone(),
            }),
        })
        .collect();

    Ok(summaries)
}
