use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::models::class_schedule::Turn;
use crate::models::user::Role;
use crate::models::{
    calendar, class_schedule, class_schedule_detail, course, course_discipline, discipline, hour,
    school_class, user,
};
use crate::services::conflict_checker::{self, ProposedSlot};
use crate::services::error::ServiceError;
use crate::utils::turns;

/// Advisory lock key serializing all schedule writes. Taken inside the write
/// transaction, before the conflict scan, so two concurrent submissions
/// cannot both pass the scan and double-book a teacher.
const SCHEDULE_WRITE_LOCK: i64 = 7_230_114;

/// The authenticated caller, as resolved from the JWT claims.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug)]
pub struct NewSchedule {
    pub calendar_id: Uuid,
    pub school_class_id: Uuid,
    pub turn: Turn,
    pub details: Vec<ProposedSlot>,
}

/// A schedule with all its relations eagerly loaded, ready for the response.
#[derive(Debug)]
pub struct ScheduleGraph {
    pub schedule: class_schedule::Model,
    pub calendar: calendar::Model,
    pub school_class: school_class::Model,
    pub course: course::Model,
    pub details: Vec<DetailGraph>,
}

#[derive(Debug)]
pub struct DetailGraph {
    pub detail: class_schedule_detail::Model,
    pub discipline: discipline::Model,
    pub hour: hour::Model,
    pub teacher: Option<user::Model>,
}

pub async fn create_schedule(
    db: &DatabaseConnection,
    actor: &Actor,
    input: NewSchedule,
) -> Result<ScheduleGraph, ServiceError> {
    let calendar = calendar::Entity::find_by_id(input.calendar_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Calendar {} not found", input.calendar_id))
        })?;

    let school_class = school_class::Entity::find_by_id(input.school_class_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Class {} not found", input.school_class_id))
        })?;

    let course = course::Entity::find_by_id(school_class.course_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Course {} not found", school_class.course_id))
        })?;

    ensure_actor_coordinates_course(actor, &course)?;
    validate_details(db, &course, input.turn, &input.details).await?;

    let txn = db.begin().await?;
    acquire_schedule_write_lock(&txn).await?;

    let duplicate = class_schedule::Entity::find()
        .filter(class_schedule::Column::CalendarId.eq(calendar.id))
        .filter(class_schedule::Column::SchoolClassId.eq(school_class.id))
        .filter(class_schedule::Column::CourseId.eq(course.id))
        .filter(class_schedule::Column::Turn.eq(input.turn))
        .filter(class_schedule::Column::IsActive.eq(true))
        .one(&txn)
        .await?;

    if duplicate.is_some() {
        let _ = txn.rollback().await;
        return Err(ServiceError::Conflict(format!(
            "A {} schedule already exists for class {} in this calendar",
            input.turn.as_str(),
            school_class.name
        )));
    }

    if let Err(e) = reject_teacher_conflicts(&txn, &input.details, None).await {
        let _ = txn.rollback().await;
        return Err(e);
    }

    let schedule_id = Uuid::new_v4();
    let now = Utc::now();

    let new_schedule = class_schedule::ActiveModel {
        id: Set(schedule_id),
        calendar_id: Set(calendar.id),
        school_class_id: Set(school_class.id),
        course_id: Set(course.id),
        turn: Set(input.turn),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    new_schedule.insert(&txn).await?;

    insert_details(&txn, schedule_id, &input.details).await?;

    txn.commit().await?;

    log::info!(
        "Schedule {} created for class {} ({}, {} slots)",
        schedule_id,
        school_class.name,
        input.turn.as_str(),
        input.details.len()
    );

    load_schedule_graph(db, schedule_id).await
}

/// Full replace of a schedule's detail rows: delete and recreate inside one
/// transaction, conflict scan excluding the schedule's own id.
pub async fn replace_schedule_details(
    db: &DatabaseConnection,
    actor: &Actor,
    schedule_id: Uuid,
    details: Vec<ProposedSlot>,
) -> Result<ScheduleGraph, ServiceError> {
    let schedule = class_schedule::Entity::find_by_id(schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Schedule {} not found", schedule_id)))?;

    if !schedule.is_active {
        return Err(ServiceError::NotFound(format!(
            "Schedule {} is archived",
            schedule_id
        )));
    }

    let course = course::Entity::find_by_id(schedule.course_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Course {} not found", schedule.course_id))
        })?;

    ensure_actor_coordinates_course(actor, &course)?;
    validate_details(db, &course, schedule.turn, &details).await?;

    let txn = db.begin().await?;
    acquire_schedule_write_lock(&txn).await?;

    if let Err(e) = reject_teacher_conflicts(&txn, &details, Some(schedule.id)).await {
        let _ = txn.rollback().await;
        return Err(e);
    }

    class_schedule_detail::Entity::delete_many()
        .filter(class_schedule_detail::Column::ClassScheduleId.eq(schedule.id))
        .exec(&txn)
        .await?;

    insert_details(&txn, schedule.id, &details).await?;

    let mut active_schedule: class_schedule::ActiveModel = schedule.into();
    active_schedule.updated_at = Set(Utc::now());
    active_schedule.update(&txn).await?;

    txn.commit().await?;

    log::info!(
        "Schedule {} details replaced ({} slots)",
        schedule_id,
        details.len()
    );

    load_schedule_graph(db, schedule_id).await
}

pub async fn load_schedule_graph(
    db: &DatabaseConnection,
    schedule_id: Uuid,
) -> Result<ScheduleGraph, ServiceError> {
    let schedule = class_schedule::Entity::find_by_id(schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Schedule {} not found", schedule_id)))?;

    let calendar = calendar::Entity::find_by_id(schedule.calendar_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Calendar {} not found", schedule.calendar_id))
        })?;

    let school_class = school_class::Entity::find_by_id(schedule.school_class_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Class {} not found", schedule.school_class_id))
        })?;

    let course = course::Entity::find_by_id(schedule.course_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Course {} not found", schedule.course_id))
        })?;

    let detail_rows = class_schedule_detail::Entity::find()
        .filter(class_schedule_detail::Column::ClassScheduleId.eq(schedule.id))
        .all(db)
        .await?;

    let discipline_ids: Vec<Uuid> = detail_rows
        .iter()
        .map(|d| d.discipline_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let hour_ids: Vec<Uuid> = detail_rows
        .iter()
        .map(|d| d.hour_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let teacher_ids: Vec<Uuid> = detail_rows
        .iter()
        .filter_map(|d| d.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let disciplines: HashMap<Uuid, discipline::Model> = discipline::Entity::find()
        .filter(discipline::Column::Id.is_in(discipline_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let hours: HashMap<Uuid, hour::Model> = hour::Entity::find()
        .filter(hour::Column::Id.is_in(hour_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let teachers: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(teacher_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut details = Vec::with_capacity(detail_rows.len());
    for detail in detail_rows {
        let discipline = disciplines
            .get(&detail.discipline_id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Discipline {} not found", detail.discipline_id))
            })?;
        let hour = hours
            .get(&detail.hour_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Hour {} not found", detail.hour_id)))?;
        let teacher = detail.user_id.and_then(|id| teachers.get(&id).cloned());

        details.push(DetailGraph {
            detail,
            discipline,
            hour,
            teacher,
        });
    }

    details.sort_by_key(|d| (d.detail.day_of_week as u8, d.hour.hour_start));

    Ok(ScheduleGraph {
        schedule,
        calendar,
        school_class,
        course,
        details,
    })
}

fn ensure_actor_coordinates_course(actor: &Actor, course: &course::Model) -> Result<(), ServiceError> {
    // Administrators may write any course's schedules; a coordinator only
    // those of the course they coordinate
    if actor.role == Role::Coordenador && course.coordinator_id != Some(actor.user_id) {
        return Err(ServiceError::Forbidden(format!(
            "You do not coordinate the course {}",
            course.name
        )));
    }
    Ok(())
}

async fn validate_details(
    db: &DatabaseConnection,
    course: &course::Model,
    turn: Turn,
    details: &[ProposedSlot],
) -> Result<(), ServiceError> {
    if details.is_empty() {
        return Err(ServiceError::Validation(
            "A schedule must have at least one detail".to_string(),
        ));
    }

    let hour_ids: Vec<Uuid> = details
        .iter()
        .map(|d| d.hour_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let hours: HashMap<Uuid, hour::Model> = hour::Entity::find()
        .filter(hour::Column::Id.is_in(hour_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    for detail in details {
        let hour = hours
            .get(&detail.hour_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Hour {} not found", detail.hour_id)))?;

        if !turns::within_turn(turn, hour.hour_start, hour.hour_end) {
            return Err(ServiceError::Validation(format!(
                "Hour {} is outside the {} window",
                hour.label(),
                turn.as_str()
            )));
        }
    }

    let duplicates = conflict_checker::duplicate_blocks(details);
    if !duplicates.is_empty() {
        let blocks: Vec<String> = duplicates
            .iter()
            .map(|(day, hour_id)| {
                let label = hours
                    .get(hour_id)
                    .map(|h| h.label())
                    .unwrap_or_else(|| hour_id.to_string());
                format!("{} {}", day.label(), label)
            })
            .collect();
        return Err(ServiceError::Conflict(format!(
            "Only one discipline per time block; duplicated: {}",
            blocks.join(", ")
        )));
    }

    let discipline_ids: Vec<Uuid> = details
        .iter()
        .map(|d| d.discipline_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let disciplines: HashMap<Uuid, discipline::Model> = discipline::Entity::find()
        .filter(discipline::Column::Id.is_in(discipline_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let course_discipline_ids: HashSet<Uuid> = course_discipline::Entity::find()
        .filter(course_discipline::Column::CourseId.eq(course.id))
        .all(db)
        .await?
        .into_iter()
        .map(|cd| cd.discipline_id)
        .collect();

    for discipline_id in &discipline_ids {
        let discipline = disciplines.get(discipline_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Discipline {} not found", discipline_id))
        })?;

        if !course_discipline_ids.contains(discipline_id) {
            return Err(ServiceError::Validation(format!(
                "Discipline {} is not part of course {}",
                discipline.name, course.name
            )));
        }
    }

    let teacher_ids: Vec<Uuid> = details
        .iter()
        .filter_map(|d| d.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let teachers: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(teacher_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    for teacher_id in &teacher_ids {
        let teacher = teachers
            .get(teacher_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Teacher {} not found", teacher_id)))?;

        if teacher.access_type != Role::Professor {
            return Err(ServiceError::Validation(format!(
                "User {} does not have the Professor role",
                teacher.name
            )));
        }
        if !teacher.is_active {
            return Err(ServiceError::Validation(format!(
                "User {} is inactive",
                teacher.name
            )));
        }
    }

    Ok(())
}

async fn acquire_schedule_write_lock(txn: &DatabaseTransaction) -> Result<(), DbErr> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [SCHEDULE_WRITE_LOCK.into()],
    ))
    .await?;
    Ok(())
}

async fn reject_teacher_conflicts(
    txn: &DatabaseTransaction,
    details: &[ProposedSlot],
    exclude_schedule_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let conflicts = conflict_checker::find_conflicts(txn, details, exclude_schedule_id).await?;

    if conflicts.is_empty() {
        return Ok(());
    }

    let messages: Vec<String> = conflicts.iter().map(|c| c.message()).collect();
    Err(ServiceError::Conflict(messages.join("; ")))
}

async fn insert_details(
    txn: &DatabaseTransaction,
    schedule_id: Uuid,
    details: &[ProposedSlot],
) -> Result<(), DbErr> {
    let now = Utc::now();

    let rows: Vec<class_schedule_detail::ActiveModel> = details
        .iter()
        .map(|detail| class_schedule_detail::ActiveModel {
            id: Set(Uuid::new_v4()),
            class_schedule_id: Set(schedule_id),
            discipline_id: Set(detail.discipline_id),
            user_id: Set(detail.user_id),
            hour_id: Set(detail.hour_id),
            day_of_week: Set(detail.day_of_week),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .collect();

    class_schedule_detail::Entity::insert_many(rows).exec(txn).await?;
    Ok(())
}
