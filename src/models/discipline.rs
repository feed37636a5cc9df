use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "disciplines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Total workload in hours.
    pub workload: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course_discipline::Entity")]
    CourseDisciplines,
    #[sea_orm(has_many = "super::class_schedule_detail::Entity")]
    ScheduleDetails,
}

impl Related<super::course_discipline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseDisciplines.def()
    }
}

impl Related<super::class_schedule_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
