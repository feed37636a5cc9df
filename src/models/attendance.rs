use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "presença")]
    #[serde(rename = "presença")]
    Presenca,
    #[sea_orm(string_value = "falta")]
    #[serde(rename = "falta")]
    Falta,
    #[sea_orm(string_value = "abonada")]
    #[serde(rename = "abonada")]
    Abonada,
}

/// One attendance record per (schedule detail, date). Created by the
/// teacher's live check-in (presença) or by the auto-absence run (falta).
/// The schema carries a unique index on (class_schedule_detail_id, date).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub class_schedule_detail_id: Uuid,
    pub date: ChronoDate,
    pub status: AttendanceStatus,
    pub justification: Option<String>,
    pub registered_by: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class_schedule_detail::Entity",
        from = "Column::ClassScheduleDetailId",
        to = "super::class_schedule_detail::Column::Id"
    )]
    ScheduleDetail,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RegisteredBy",
        to = "super::user::Column::Id"
    )]
    RegisteredByUser,
}

impl Related<super::class_schedule_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleDetail.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RegisteredByUser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
