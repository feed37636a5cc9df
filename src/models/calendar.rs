use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An academic term. A date is "active" under the calendar whose
/// start_date..=end_date range contains it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "calendars")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub year: i32,
    /// Semester within the year: 1 or 2.
    pub period: i16,
    pub start_date: ChronoDate,
    pub end_date: ChronoDate,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::class_schedule::Entity")]
    ClassSchedules,
    #[sea_orm(has_many = "super::school_saturday::Entity")]
    SchoolSaturdays,
}

impl Related<super::class_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassSchedules.def()
    }
}

impl Related<super::school_saturday::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolSaturdays.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn covers(&self, date: chrono::NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
