use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A fixed lesson time block, independent of day. Many schedule details
/// reference one hour; the interval must lie inside exactly one turn window.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hours")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub hour_start: ChronoTime,
    pub hour_end: ChronoTime,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::class_schedule_detail::Entity")]
    ScheduleDetails,
}

impl Related<super::class_schedule_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// "HH:MM - HH:MM", used in conflict messages and responses.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.hour_start.format("%H:%M"),
            self.hour_end.format("%H:%M")
        )
    }
}
