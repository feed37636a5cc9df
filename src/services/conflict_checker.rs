use std::collections::{HashMap, HashSet};

use sea_orm::*;
use serde::Serialize;
use uuid::Uuid;

use crate::models::class_schedule_detail::Weekday;
use crate::models::{
    class_schedule, class_schedule_detail, course, discipline, hour, school_class, user,
};

/// One proposed slot of a schedule submission, after request decoding.
#[derive(Debug, Clone)]
pub struct ProposedSlot {
    pub discipline_id: Uuid,
    pub hour_id: Uuid,
    pub day_of_week: Weekday,
    pub user_id: Option<Uuid>,
}

/// An existing booking that collides with a proposed slot. Carries enough
/// context to tell the caller exactly which assignment clashes where.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleConflict {
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub day_of_week: Weekday,
    pub hour: String,
    pub discipline: String,
    pub school_class: String,
    pub course: String,
}

impl ScheduleConflict {
    pub fn message(&self) -> String {
        format!(
            "{} already teaches {} on {} at {} for class {} of course {}",
            self.teacher_name,
            self.discipline,
            self.day_of_week.label(),
            self.hour,
            self.school_class,
            self.course
        )
    }
}

/// (day, hour) blocks claimed by more than one slot within one submission.
/// Slots without a teacher still occupy their block.
pub fn duplicate_blocks(details: &[ProposedSlot]) -> Vec<(Weekday, Uuid)> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();

    for detail in details {
        let block = (detail.day_of_week, detail.hour_id);
        if !seen.insert(block) && !duplicates.contains(&block) {
            duplicates.push(block);
        }
    }

    duplicates
}

/// Scan every detail row of other active schedules for teacher double
/// bookings against the proposed slots. All proposals are checked in one
/// pass; every collision is returned, not just the first.
pub async fn find_conflicts<C>(
    db: &C,
    proposed: &[ProposedSlot],
    exclude_schedule_id: Option<Uuid>,
) -> Result<Vec<ScheduleConflict>, DbErr>
where
    C: ConnectionTrait,
{
    let teacher_ids: Vec<Uuid> = proposed
        .iter()
        .filter_map(|slot| slot.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    // Slots with no assigned teacher are exempt from cross-schedule checks
    if teacher_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = class_schedule_detail::Entity::find()
        .find_also_related(class_schedule::Entity)
        .filter(class_schedule_detail::Column::UserId.is_in(teacher_ids))
        .filter(class_schedule::Column::IsActive.eq(true));

    if let Some(schedule_id) = exclude_schedule_id {
        query = query.filter(class_schedule_detail::Column::ClassScheduleId.ne(schedule_id));
    }

    let existing = query.all(db).await?;

    let proposed_keys: HashSet<(Uuid, Weekday, Uuid)> = proposed
        .iter()
        .filter_map(|slot| {
            slot.user_id
                .map(|teacher| (teacher, slot.day_of_week, slot.hour_id))
        })
        .collect();

    let colliding: Vec<(class_schedule_detail::Model, class_schedule::Model)> = existing
        .into_iter()
        .filter_map(|(detail, schedule)| {
            let schedule = schedule?;
            let teacher = detail.user_id?;
            proposed_keys
                .contains(&(teacher, detail.day_of_week, detail.hour_id))
                .then_some((detail, schedule))
        })
        .collect();

    if colliding.is_empty() {
        return Ok(Vec::new());
    }

    // Resolve names for the offending rows so the rejection is actionable
    let teacher_id_set: Vec<Uuid> = colliding
        .iter()
        .filter_map(|(d, _)| d.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let discipline_ids: Vec<Uuid> = colliding
        .iter()
        .map(|(d, _)| d.discipline_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let hour_ids: Vec<Uuid> = colliding
        .iter()
        .map(|(d, _)| d.hour_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let class_ids: Vec<Uuid> = colliding
        .iter()
        .map(|(_, s)| s.school_class_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let course_ids: Vec<Uuid> = colliding
        .iter()
        .map(|(_, s)| s.course_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut teacher_names: HashMap<Uuid, String> = HashMap::new();
    for teacher in user::Entity::find()
        .filter(user::Column::Id.is_in(teacher_id_set))
        .all(db)
        .await?
    {
        teacher_names.insert(teacher.id, teacher.name);
    }

    let mut discipline_names: HashMap<Uuid, String> = HashMap::new();
    for item in discipline::Entity::find()
        .filter(discipline::Column::Id.is_in(discipline_ids))
        .all(db)
        .await?
    {
        discipline_names.insert(item.id, item.name);
    }

    let mut hour_labels: HashMap<Uuid, String> = HashMap::new();
    for item in hour::Entity::find()
        .filter(hour::Column::Id.is_in(hour_ids))
        .all(db)
        .await?
    {
        hour_labels.insert(item.id, item.label());
    }

    let mut class_names: HashMap<Uuid, String> = HashMap::new();
    for item in school_class::Entity::find()
        .filter(school_class::Column::Id.is_in(class_ids))
        .all(db)
        .await?
    {
        class_names.insert(item.id, item.name);
    }

    let mut course_names: HashMap<Uuid, String> = HashMap::new();
    for item in course::Entity::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await?
    {
        course_names.insert(item.id, item.name);
    }

    let unknown = || "desconhecido".to_string();

    let conflicts = colliding
        .into_iter()
        .filter_map(|(detail, schedule)| {
            let teacher_id = detail.user_id?;
            Some(ScheduleConflict {
                teacher_id,
                teacher_name: teacher_names.get(&teacher_id).cloned().unwrap_or_else(unknown),
                day_of_week: detail.day_of_week,
                hour: hour_labels.get(&detail.hour_id).cloned().unwrap_or_else(unknown),
                discipline: discipline_names
                    .get(&detail.discipline_id)
                    .cloned()
                    .unwrap_or_else(unknown),
                school_class: class_names
                    .get(&schedule.school_class_id)
                    .cloned()
                    .unwrap_or_else(unknown),
                course: course_names
                    .get(&schedule.course_id)
                    .cloned()
                    .unwrap_or_else(unknown),
            })
        })
        .collect();

    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(day: Weekday, hour: Uuid, teacher: Option<Uuid>) -> ProposedSlot {
        ProposedSlot {
            discipline_id: Uuid::new_v4(),
            hour_id: hour,
            day_of_week: day,
            user_id: teacher,
        }
    }

    #[test]
    fn test_duplicate_blocks_detects_shared_day_hour() {
        let hour_a = Uuid::new_v4();
        let hour_b = Uuid::new_v4();

        let details = vec![
            slot(Weekday::Segunda, hour_a, Some(Uuid::new_v4())),
            slot(Weekday::Segunda, hour_a, Some(Uuid::new_v4())),
            slot(Weekday::Segunda, hour_b, None),
            slot(Weekday::Terca, hour_a, None),
        ];

        assert_eq!(duplicate_blocks(&details), vec![(Weekday::Segunda, hour_a)]);
    }

    #[test]
    fn test_duplicate_blocks_counts_unassigned_slots() {
        let hour = Uuid::new_v4();
        // Neither slot has a teacher; the block is still taken twice
        let details = vec![
            slot(Weekday::Quarta, hour, None),
            slot(Weekday::Quarta, hour, None),
        ];

        assert_eq!(duplicate_blocks(&details), vec![(Weekday::Quarta, hour)]);
    }

    #[test]
    fn test_duplicate_blocks_reports_each_block_once() {
        let hour = Uuid::new_v4();
        let details = vec![
            slot(Weekday::Sexta, hour, None),
            slot(Weekday::Sexta, hour, None),
            slot(Weekday::Sexta, hour, None),
        ];

        assert_eq!(duplicate_blocks(&details).len(), 1);
    }

    #[test]
    fn test_conflict_message_names_everything() {
        let conflict = ScheduleConflict {
            teacher_id: Uuid::new_v4(),
            teacher_name: "Maria Silva".to_string(),
            day_of_week: Weekday::Terca,
            hour: "08:00 - 08:50".to_string(),
            discipline: "Matemática".to_string(),
            school_class: "1º A".to_string(),
            course: "Ensino Médio".to_string(),
        };

        let message = conflict.message();
        assert!(message.contains("Maria Silva"));
        assert!(message.contains("Terça-feira"));
        assert!(message.contains("08:00 - 08:50"));
        assert!(message.contains("Matemática"));
        assert!(message.contains("1º A"));
        assert!(message.contains("Ensino Médio"));
    }
}
