use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access profile of a user. Closed set; every permission check goes
/// through the capability methods below instead of comparing strings.
#[derive(Copy, Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "access_type")]
pub enum Role {
    #[sea_orm(string_value = "Administrador")]
    Administrador,
    #[sea_orm(string_value = "Coordenador")]
    Coordenador,
    #[sea_orm(string_value = "Professor")]
    Professor,
}

impl Role {
    /// Create, replace and archive class schedules.
    pub fn can_manage_schedules(self) -> bool {
        matches!(self, Role::Administrador | Role::Coordenador)
    }

    /// Check in for the current turn.
    pub fn can_register_attendance(self) -> bool {
        matches!(self, Role::Professor)
    }

    /// Manually trigger the auto-absence run.
    pub fn can_trigger_absence_run(self) -> bool {
        matches!(self, Role::Administrador | Role::Coordenador)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub access_type: Role,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course::Entity")]
    Courses,
    #[sea_orm(has_many = "super::class_schedule_detail::Entity")]
    ScheduleDetails,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendances,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl Related<super::class_schedule_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleDetails.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Coordenador.can_manage_schedules());
        assert!(Role::Administrador.can_manage_schedules());
        assert!(!Role::Professor.can_manage_schedules());

        assert!(Role::Professor.can_register_attendance());
        assert!(!Role::Coordenador.can_register_attendance());

        assert!(Role::Coordenador.can_trigger_absence_run());
        assert!(!Role::Professor.can_trigger_absence_run());
    }
}
