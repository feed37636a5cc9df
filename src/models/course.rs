use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Coordinator responsible for this course's schedules.
    pub coordinator_id: Option<Uuid>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CoordinatorId",
        to = "super::user::Column::Id"
    )]
    Coordinator,
    #[sea_orm(has_many = "super::school_class::Entity")]
    SchoolClasses,
    #[sea_orm(has_many = "super::course_discipline::Entity")]
    CourseDisciplines,
    #[sea_orm(has_many = "super::class_schedule::Entity")]
    ClassSchedules,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coordinator.def()
    }
}

impl Related<super::school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClasses.def()
    }
}

impl Related<super::course_discipline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseDisciplines.def()
    }
}

impl Related<super::class_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassSchedules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
