use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration as TokioDuration};
use uuid::Uuid;

use crate::models::attendance::{self, AttendanceStatus};
use crate::models::class_schedule::{self, Turn};
use crate::models::class_schedule_detail;
use crate::models::{calendar, hour};
use crate::services::attendance_service::{active_calendar, holiday_on, resolve_weekday};
use crate::services::error::ServiceError;
use crate::utils::config::Config;
use crate::utils::turns;

#[derive(Debug, Serialize)]
pub struct AbsenceRunSummary {
    pub date: NaiveDate,
    pub turn: Turn,
    /// Reason the run was a no-op (holiday, no covering calendar), if so.
    pub skipped_reason: Option<String>,
    pub slots_scanned: usize,
    pub absences_inserted: usize,
    pub already_recorded: usize,
    pub skipped_no_teacher: usize,
}

impl AbsenceRunSummary {
    fn skipped(date: NaiveDate, turn: Turn, reason: String) -> Self {
        Self {
            date,
            turn,
            skipped_reason: Some(reason),
            slots_scanned: 0,
            absences_inserted: 0,
            already_recorded: 0,
            skipped_no_teacher: 0,
        }
    }
}

/// Record a falta for every slot of (date, turn) that has no attendance row
/// yet. Idempotent: re-running only fills still-missing rows. The whole run
/// is one transaction; any error rolls back every insert of the run.
pub async fn run_auto_absence(
    db: &DatabaseConnection,
    date: NaiveDate,
    turn: Turn,
) -> Result<AbsenceRunSummary, ServiceError> {
    if let Some(holiday) = holiday_on(db, date).await? {
        return Ok(AbsenceRunSummary::skipped(
            date,
            turn,
            format!("holiday: {}", holiday.description),
        ));
    }

    let Some(calendar) = active_calendar(db, date).await? else {
        return Ok(AbsenceRunSummary::skipped(
            date,
            turn,
            format!("no active calendar covers {}", date),
        ));
    };

    let weekday = resolve_weekday(db, calendar.id, date).await?;

    let txn = db.begin().await?;

    let slots = class_schedule_detail::Entity::find()
        .join(
            JoinType::InnerJoin,
            class_schedule_detail::Relation::ClassSchedule.def(),
        )
        .filter(class_schedule_detail::Column::DayOfWeek.eq(weekday))
        .filter(class_schedule::Column::CalendarId.eq(calendar.id))
        .filter(class_schedule::Column::IsActive.eq(true))
        .all(&txn)
        .await?;

    let hour_ids: Vec<Uuid> = slots
        .iter()
        .map(|s| s.hour_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let hours: HashMap<Uuid, hour::Model> = hour::Entity::find()
        .filter(hour::Column::Id.is_in(hour_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    // Only slots whose hour interval lies fully inside this turn's window
    let eligible: Vec<&class_schedule_detail::Model> = slots
        .iter()
        .filter(|slot| {
            hours
                .get(&slot.hour_id)
                .is_some_and(|h| turns::within_turn(turn, h.hour_start, h.hour_end))
        })
        .collect();

    let eligible_ids: Vec<Uuid> = eligible.iter().map(|s| s.id).collect();
    let existing: HashSet<Uuid> = attendance::Entity::find()
        .filter(attendance::Column::ClassScheduleDetailId.is_in(eligible_ids))
        .filter(attendance::Column::Date.eq(date))
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| a.class_schedule_detail_id)
        .collect();

    let mut summary = AbsenceRunSummary {
        date,
        turn,
        skipped_reason: None,
        slots_scanned: eligible.len(),
        absences_inserted: 0,
        already_recorded: 0,
        skipped_no_teacher: 0,
    };
    let now = Utc::now();

    for slot in eligible {
        if existing.contains(&slot.id) {
            summary.already_recorded += 1;
            continue;
        }

        let Some(teacher_id) = slot.user_id else {
            log::warn!(
                "Slot {} ({} {}) has no assigned teacher; skipped by absence run",
                slot.id,
                weekday.label(),
                turn.as_str()
            );
            summary.skipped_no_teacher += 1;
            continue;
        };

        let row = attendance::ActiveModel {
            id: Set(Uuid::new_v4()),
            class_schedule_detail_id: Set(slot.id),
            date: Set(date),
            status: Set(AttendanceStatus::Falta),
            justification: Set(None),
            registered_by: Set(teacher_id),
            latitude: Set(None),
            longitude: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        row.insert(&txn).await?;
        summary.absences_inserted += 1;
    }

    txn.commit().await?;

    Ok(summary)
}

/// Flip is_active off for schedules whose calendar has ended.
pub async fn archive_expired_schedules(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<u64, DbErr> {
    let expired_calendar_ids: Vec<Uuid> = calendar::Entity::find()
        .filter(calendar::Column::EndDate.lt(today))
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    if expired_calendar_ids.is_empty() {
        return Ok(0);
    }

    let result = class_schedule::Entity::update_many()
        .col_expr(class_schedule::Column::IsActive, Expr::value(false))
        .col_expr(class_schedule::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(class_schedule::Column::CalendarId.is_in(expired_calendar_ids))
        .filter(class_schedule::Column::IsActive.eq(true))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// The most recent date whose (turn end + tolerance) cutoff has passed at
/// `now_local`. NOTURNO's cutoff crosses midnight, so its run for a date
/// only becomes due early on the following day. Runs are idempotent, so
/// re-resolving a date that was already processed is harmless; this also
/// lets a restarted scheduler catch up on the last missed cycle.
pub fn due_date_for(turn: Turn, now_local: NaiveDateTime) -> Option<NaiveDate> {
    let (_, end) = turns::turn_window(turn);
    let (cutoff, wrapped) =
        end.overflowing_add_signed(Duration::minutes(turns::CHECKIN_TOLERANCE_MINUTES));

    let mut days_back: u64 = if now_local.time() > cutoff { 0 } else { 1 };
    if wrapped != 0 {
        days_back += 1;
    }

    now_local.date().checked_sub_days(chrono::Days::new(days_back))
}

/// Background task converting unrecorded slots into faltas once each turn's
/// window (plus tolerance) has passed, and archiving schedules of expired
/// calendars once a day.
pub struct AbsenceScheduler {
    db: DatabaseConnection,
    config: Config,
    check_interval_seconds: u64,
    completed: Mutex<HashSet<(NaiveDate, Turn)>>,
    archived_on: Mutex<Option<NaiveDate>>,
}

impl AbsenceScheduler {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            db,
            config,
            check_interval_seconds: 60, // Check every minute
            completed: Mutex::new(HashSet::new()),
            archived_on: Mutex::new(None),
        }
    }

    /// Start the background scheduler
    pub async fn start(self: Arc<Self>) {
        log::info!(
            "Starting auto-absence scheduler (checking every {} seconds)",
            self.check_interval_seconds
        );

        loop {
            if let Err(e) = self.tick().await {
                log::error!("Error in auto-absence scheduler: {}", e);
            }

            sleep(TokioDuration::from_secs(self.check_interval_seconds)).await;
        }
    }

    async fn tick(&self) -> Result<(), ServiceError> {
        let now_local = turns::to_local(Utc::now(), self.config.utc_offset_hours);
        let today = now_local.date();

        for turn in [Turn::Matutino, Turn::Vespertino, Turn::Noturno] {
            let Some(due_date) = due_date_for(turn, now_local) else {
                continue;
            };

            {
                let completed = self.completed.lock().await;
                if completed.contains(&(due_date, turn)) {
                    continue;
                }
            }

            match run_auto_absence(&self.db, due_date, turn).await {
                Ok(summary) => {
                    match &summary.skipped_reason {
                        Some(reason) => log::info!(
                            "Auto-absence run skipped for {} {}: {}",
                            due_date,
                            turn.as_str(),
                            reason
                        ),
                        None => log::info!(
                            "Auto-absence run for {} {}: {} slots, {} faltas inserted, {} already recorded, {} without teacher",
                            due_date,
                            turn.as_str(),
                            summary.slots_scanned,
                            summary.absences_inserted,
                            summary.already_recorded,
                            summary.skipped_no_teacher
                        ),
                    }

                    let mut completed = self.completed.lock().await;
                    completed.insert((due_date, turn));
                    completed.retain(|(date, _)| *date + Duration::days(2) >= today);
                }
                Err(e) => {
                    // Left out of the completed set so the next tick retries
                    log::error!(
                        "Auto-absence run failed for {} {}: {}",
                        due_date,
                        turn.as_str(),
                        e
                    );
                }
            }
        }

        let mut archived_on = self.archived_on.lock().await;
        if *archived_on != Some(today) {
            let archived = archive_expired_schedules(&self.db, today).await?;
            if archived > 0 {
                log::info!("Archived {} schedules from expired calendars", archived);
            }
            *archived_on = Some(today);
        }

        Ok(())
    }
}

/// Start the absence scheduler in the background
pub fn start_absence_scheduler(
    db: DatabaseConnection,
    config: Config,
) -> tokio::task::JoinHandle<()> {
    let scheduler = Arc::new(AbsenceScheduler::new(db, config));

    tokio::spawn(async move {
        scheduler.start().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(date: (i32, u32, u32), time: (u32, u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(time.0, time.1, time.2).unwrap())
    }

    #[test]
    fn test_matutino_due_after_end_plus_tolerance() {
        // Before the 12:09:59 cutoff only the previous day is due
        let before = at((2025, 6, 2), (12, 9, 59));
        assert_eq!(
            due_date_for(Turn::Matutino, before),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );

        let after = at((2025, 6, 2), (12, 10, 0));
        assert_eq!(
            due_date_for(Turn::Matutino, after),
            NaiveDate::from_ymd_opt(2025, 6, 2)
        );
    }

    #[test]
    fn test_vespertino_due_in_evening() {
        let evening = at((2025, 6, 2), (18, 30, 0));
        assert_eq!(
            due_date_for(Turn::Vespertino, evening),
            NaiveDate::from_ymd_opt(2025, 6, 2)
        );
    }

    #[test]
    fn test_noturno_due_next_morning() {
        // Before midnight today's NOTURNO is not due yet
        let late = at((2025, 6, 2), (23, 59, 0));
        assert_eq!(
            due_date_for(Turn::Noturno, late),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );

        // Past 00:09:59 the previous day's NOTURNO becomes due
        let next_morning = at((2025, 6, 3), (0, 10, 0));
        assert_eq!(
            due_date_for(Turn::Noturno, next_morning),
            NaiveDate::from_ymd_opt(2025, 6, 2)
        );
    }
}
