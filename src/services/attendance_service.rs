use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::*;
use serde::Serialize;
use uuid::Uuid;

use crate::models::attendance::{self, AttendanceStatus};
use crate::models::class_schedule::{self, Turn};
use crate::models::class_schedule_detail::{self, Weekday};
use crate::models::{calendar, discipline, holiday, hour, school_saturday};
use crate::services::error::ServiceError;
use crate::utils::geo::haversine_distance_m;
use crate::utils::turns;

/// Campus reference point for check-in geofencing, taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct Campus {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Debug, Serialize)]
pub struct SlotRegistration {
    pub attendance_id: Uuid,
    pub class_schedule_detail_id: Uuid,
    pub discipline: String,
    pub hour: String,
    pub status: AttendanceStatus,
    /// True when the row already existed and this call changed nothing.
    pub already_registered: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckinOutcome {
    pub turn: Turn,
    pub message: String,
    pub registrations: Vec<SlotRegistration>,
    pub holiday: bool,
}

/// The calendar whose range contains `date`, if any.
pub async fn active_calendar<C>(db: &C, date: NaiveDate) -> Result<Option<calendar::Model>, DbErr>
where
    C: ConnectionTrait,
{
    calendar::Entity::find()
        .filter(calendar::Column::StartDate.lte(date))
        .filter(calendar::Column::EndDate.gte(date))
        .one(db)
        .await
}

pub async fn holiday_on<C>(db: &C, date: NaiveDate) -> Result<Option<holiday::Model>, DbErr>
where
    C: ConnectionTrait,
{
    holiday::Entity::find()
        .filter(holiday::Column::Date.eq(date))
        .one(db)
        .await
}

/// Weekday label of `date`, substituting the recorded reference day when the
/// calendar marks it as a school Saturday.
pub async fn resolve_weekday<C>(
    db: &C,
    calendar_id: Uuid,
    date: NaiveDate,
) -> Result<Weekday, DbErr>
where
    C: ConnectionTrait,
{
    let natural = Weekday::from_date(date);
    if natural != Weekday::Sabado {
        return Ok(natural);
    }

    let substitution = school_saturday::Entity::find()
        .filter(school_saturday::Column::CalendarId.eq(calendar_id))
        .filter(school_saturday::Column::Date.eq(date))
        .one(db)
        .await?;

    Ok(substitution.map_or(Weekday::Sabado, |s| s.reference_day))
}

/// Teacher check-in: resolve the active turn from campus wall-clock time and
/// idempotently mark every one of the caller's slots for that turn as
/// presença. The step order and the distinct rejection for each step follow
/// the check-in state machine.
pub async fn register_by_turn(
    db: &DatabaseConnection,
    campus: &Campus,
    teacher_id: Uuid,
    latitude: f64,
    longitude: f64,
    now_local: NaiveDateTime,
) -> Result<CheckinOutcome, ServiceError> {
    let today = now_local.date();

    let turn = turns::turn_of(now_local.time()).ok_or_else(|| {
        ServiceError::Validation("Check-in is outside every turn window".to_string())
    })?;

    if turns::past_grace(turn, now_local.time()) {
        return Err(ServiceError::Validation(format!(
            "The {} turn closed more than {} minutes ago",
            turn.as_str(),
            turns::CHECKIN_TOLERANCE_MINUTES
        )));
    }

    let distance =
        haversine_distance_m(campus.latitude, campus.longitude, latitude, longitude);
    if distance > campus.radius_meters {
        return Err(ServiceError::Forbidden(format!(
            "You are {:.0} m away from campus; check-in is allowed within {:.0} m",
            distance, campus.radius_meters
        )));
    }

    if let Some(holiday) = holiday_on(db, today).await? {
        return Ok(CheckinOutcome {
            turn,
            message: format!(
                "Today is a holiday ({}); no attendance required",
                holiday.description
            ),
            registrations: Vec::new(),
            holiday: true,
        });
    }

    let calendar = active_calendar(db, today).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("No active calendar covers {}", today))
    })?;

    let weekday = resolve_weekday(db, calendar.id, today).await?;

    let slots = class_schedule_detail::Entity::find()
        .join(
            JoinType::InnerJoin,
            class_schedule_detail::Relation::ClassSchedule.def(),
        )
        .filter(class_schedule_detail::Column::UserId.eq(teacher_id))
        .filter(class_schedule_detail::Column::DayOfWeek.eq(weekday))
        .filter(class_schedule::Column::Turn.eq(turn))
        .filter(class_schedule::Column::CalendarId.eq(calendar.id))
        .filter(class_schedule::Column::IsActive.eq(true))
        .all(db)
        .await?;

    if slots.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "No classes scheduled for you in the {} turn on {}",
            turn.as_str(),
            weekday.label()
        )));
    }

    let discipline_names = discipline_names_for(db, &slots).await?;
    let hour_labels = hour_labels_for(db, &slots).await?;

    let txn = db.begin().await?;

    let slot_ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let existing: HashMap<Uuid, attendance::Model> = attendance::Entity::find()
        .filter(attendance::Column::ClassScheduleDetailId.is_in(slot_ids))
        .filter(attendance::Column::Date.eq(today))
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| (a.class_schedule_detail_id, a))
        .collect();

    let mut registrations = Vec::with_capacity(slots.len());
    let mut created = 0usize;
    let now = chrono::Utc::now();

    for slot in &slots {
        let discipline = discipline_names
            .get(&slot.discipline_id)
            .cloned()
            .unwrap_or_default();
        let hour = hour_labels.get(&slot.hour_id).cloned().unwrap_or_default();

        if let Some(row) = existing.get(&slot.id) {
            registrations.push(SlotRegistration {
                attendance_id: row.id,
                class_schedule_detail_id: slot.id,
                discipline,
                hour,
                status: row.status,
                already_registered: true,
            });
            continue;
        }

        let attendance_id = Uuid::new_v4();
        let row = attendance::ActiveModel {
            id: Set(attendance_id),
            class_schedule_detail_id: Set(slot.id),
            date: Set(today),
            status: Set(AttendanceStatus::Presenca),
            justification: Set(None),
            registered_by: Set(teacher_id),
            latitude: Set(Some(latitude)),
            longitude: Set(Some(longitude)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        row.insert(&txn).await?;
        created += 1;

        registrations.push(SlotRegistration {
            attendance_id,
            class_schedule_detail_id: slot.id,
            discipline,
            hour,
            status: AttendanceStatus::Presenca,
            already_registered: false,
        });
    }

    txn.commit().await?;

    let message = if created == 0 {
        format!(
            "Attendance already registered for the {} turn",
            turn.as_str()
        )
    } else {
        format!(
            "Attendance registered for {} of {} slots in the {} turn",
            created,
            slots.len(),
            turn.as_str()
        )
    };

    log::info!(
        "Check-in by {}: {} ({} created, {} existing)",
        teacher_id,
        turn.as_str(),
        created,
        slots.len() - created
    );

    Ok(CheckinOutcome {
        turn,
        message,
        registrations,
        holiday: false,
    })
}

#[derive(Debug, Default)]
pub struct HistoryFilter {
    pub turn: Option<Turn>,
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceHistoryEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub justification: Option<String>,
    pub turn: Turn,
    pub day_of_week: Weekday,
    pub hour: String,
    pub discipline: String,
}

/// The caller's own attendance history, newest first.
pub async fn attendance_history(
    db: &DatabaseConnection,
    teacher_id: Uuid,
    filter: HistoryFilter,
) -> Result<Vec<AttendanceHistoryEntry>, ServiceError> {
    let mut details_query = class_schedule_detail::Entity::find()
        .find_also_related(class_schedule::Entity)
        .filter(class_schedule_detail::Column::UserId.eq(teacher_id));

    if let Some(turn) = filter.turn {
        details_query = details_query.filter(class_schedule::Column::Turn.eq(turn));
    }

    let details = details_query.all(db).await?;
    if details.is_empty() {
        return Ok(Vec::new());
    }

    let turns_by_detail: HashMap<Uuid, Turn> = details
        .iter()
        .filter_map(|(d, s)| s.as_ref().map(|s| (d.id, s.turn)))
        .collect();
    let detail_rows: Vec<class_schedule_detail::Model> =
        details.into_iter().map(|(d, _)| d).collect();

    let discipline_names = discipline_names_for(db, &detail_rows).await?;
    let hour_labels = hour_labels_for(db, &detail_rows).await?;
    let details_by_id: HashMap<Uuid, &class_schedule_detail::Model> =
        detail_rows.iter().map(|d| (d.id, d)).collect();

    let mut attendance_query = attendance::Entity::find()
        .filter(
            attendance::Column::ClassScheduleDetailId
                .is_in(detail_rows.iter().map(|d| d.id).collect::<Vec<_>>()),
        )
        .order_by_desc(attendance::Column::Date);

    if let Some(date) = filter.date {
        attendance_query = attendance_query.filter(attendance::Column::Date.eq(date));
    }
    if let Some(status) = filter.status {
        attendance_query = attendance_query.filter(attendance::Column::Status.eq(status));
    }

    let rows = attendance_query.all(db).await?;

    let entries = rows
        .into_iter()
        .filter_map(|row| {
            let detail = details_by_id.get(&row.class_schedule_detail_id)?;
            let turn = turns_by_detail.get(&detail.id)?;
            Some(AttendanceHistoryEntry {
                id: row.id,
                date: row.date,
                status: row.status,
                justification: row.justification,
                turn: *turn,
                day_of_week: detail.day_of_week,
                hour: hour_labels.get(&detail.hour_id).cloned().unwrap_or_default(),
                discipline: discipline_names
                    .get(&detail.discipline_id)
                    .cloned()
                    .unwrap_or_default(),
            })
        })
        .collect();

    Ok(entries)
}

async fn discipline_names_for<C>(
    db: &C,
    details: &[class_schedule_detail::Model],
) -> Result<HashMap<Uuid, String>, DbErr>
where
    C: ConnectionTrait,
{
    let ids: Vec<Uuid> = details
        .iter()
        .map(|d| d.discipline_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    Ok(discipline::Entity::find()
        .filter(discipline::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect())
}

async fn hour_labels_for<C>(
    db: &C,
    details: &[class_schedule_detail::Model],
) -> Result<HashMap<Uuid, String>, DbErr>
where
    C: ConnectionTrait,
{
    let ids: Vec<Uuid> = details
        .iter()
        .map(|d| d.hour_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    Ok(hour::Entity::find()
        .filter(hour::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m.label()))
        .collect())
}
