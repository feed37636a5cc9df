use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily shift a schedule belongs to.
#[derive(
    Copy, Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "turn")]
pub enum Turn {
    #[sea_orm(string_value = "MATUTINO")]
    #[serde(rename = "MATUTINO")]
    Matutino,
    #[sea_orm(string_value = "VESPERTINO")]
    #[serde(rename = "VESPERTINO")]
    Vespertino,
    #[sea_orm(string_value = "NOTURNO")]
    #[serde(rename = "NOTURNO")]
    Noturno,
}

impl Turn {
    pub fn as_str(self) -> &'static str {
        match self {
            Turn::Matutino => "MATUTINO",
            Turn::Vespertino => "VESPERTINO",
            Turn::Noturno => "NOTURNO",
        }
    }
}

/// One timetable: the grid of a (calendar, class, course, turn) tuple.
/// Archived (is_active = false) once its calendar's end_date has passed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub school_class_id: Uuid,
    pub course_id: Uuid,
    pub turn: Turn,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::calendar::Entity",
        from = "Column::CalendarId",
        to = "super::calendar::Column::Id"
    )]
    Calendar,
    #[sea_orm(
        belongs_to = "super::school_class::Entity",
        from = "Column::SchoolClassId",
        to = "super::school_class::Column::Id"
    )]
    SchoolClass,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    #[sea_orm(has_many = "super::class_schedule_detail::Entity")]
    Details,
}

impl Related<super::calendar::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Calendar.def()
    }
}

impl Related<super::school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClass.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::class_schedule_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
