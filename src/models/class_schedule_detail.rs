use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekday labels as stored and displayed. A school Saturday substitutes
/// one of the weekday labels for Sábado on a specific date.
#[derive(
    Copy, Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "day_of_week")]
pub enum Weekday {
    #[sea_orm(string_value = "Domingo")]
    #[serde(rename = "Domingo")]
    Domingo,
    #[sea_orm(string_value = "Segunda-feira")]
    #[serde(rename = "Segunda-feira")]
    Segunda,
    #[sea_orm(string_value = "Terça-feira")]
    #[serde(rename = "Terça-feira")]
    Terca,
    #[sea_orm(string_value = "Quarta-feira")]
    #[serde(rename = "Quarta-feira")]
    Quarta,
    #[sea_orm(string_value = "Quinta-feira")]
    #[serde(rename = "Quinta-feira")]
    Quinta,
    #[sea_orm(string_value = "Sexta-feira")]
    #[serde(rename = "Sexta-feira")]
    Sexta,
    #[sea_orm(string_value = "Sábado")]
    #[serde(rename = "Sábado")]
    Sabado,
}

impl Weekday {
    /// Calendar weekday of a date, before any school-Saturday substitution.
    pub fn from_date(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        match date.weekday() {
            chrono::Weekday::Sun => Weekday::Domingo,
            chrono::Weekday::Mon => Weekday::Segunda,
            chrono::Weekday::Tue => Weekday::Terca,
            chrono::Weekday::Wed => Weekday::Quarta,
            chrono::Weekday::Thu => Weekday::Quinta,
            chrono::Weekday::Fri => Weekday::Sexta,
            chrono::Weekday::Sat => Weekday::Sabado,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Domingo => "Domingo",
            Weekday::Segunda => "Segunda-feira",
            Weekday::Terca => "Terça-feira",
            Weekday::Quarta => "Quarta-feira",
            Weekday::Quinta => "Quinta-feira",
            Weekday::Sexta => "Sexta-feira",
            Weekday::Sabado => "Sábado",
        }
    }
}

/// One slot of a schedule: a discipline (and optionally a teacher) assigned
/// to a (day, hour) block.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_schedule_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub class_schedule_id: Uuid,
    pub discipline_id: Uuid,
    /// Teacher assigned to the slot; a slot may be left unassigned.
    pub user_id: Option<Uuid>,
    pub hour_id: Uuid,
    pub day_of_week: Weekday,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class_schedule::Entity",
        from = "Column::ClassScheduleId",
        to = "super::class_schedule::Column::Id"
    )]
    ClassSchedule,
    #[sea_orm(
        belongs_to = "super::discipline::Entity",
        from = "Column::DisciplineId",
        to = "super::discipline::Column::Id"
    )]
    Discipline,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::hour::Entity",
        from = "Column::HourId",
        to = "super::hour::Column::Id"
    )]
    Hour,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendances,
}

impl Related<super::class_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassSchedule.def()
    }
}

impl Related<super::discipline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discipline.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::hour::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hour.def()
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
    use chrono::NaiveDate;

    #[test]
    fn test_weekday_from_date() {
        // 2025-06-02 is a Monday
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(Weekday::from_date(monday), Weekday::Segunda);
        assert_eq!(
            Weekday::from_date(monday.succ_opt().unwrap()),
            Weekday::Terca
        );

        let saturday = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        assert_eq!(Weekday::from_date(saturday), Weekday::Sabado);
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        assert_eq!(Weekday::from_date(sunday), Weekday::Domingo);
    }

    #[test]
    fn test_weekday_labels() {
        assert_eq!(Weekday::Terca.label(), "Terça-feira");
        assert_eq!(Weekday::Sabado.label(), "Sábado");
    }
}
