use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "websites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub url: String,
    /// Seconds between checks. The CRUD layer keeps this within [60, 3600].
    pub check_interval: i32,
    /// Per-request timeout in seconds, within [5, 60].
    pub timeout: i32,
    /// `up` / `down` / `unknown`; NULL only for rows that have never been
    /// written by the scheduler or the CRUD layer.
    pub status: Option<String>,
    pub last_check: Option<ChronoDateTimeUtc>,
    /// Seconds; present only when an HTTP exchange completed.
    pub response_time: Option<f64>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::monitor_log::Entity")]
    MonitorLog,

    #[sea_orm(has_many = "super::alert_log::Entity")]
    AlertLog,

    #[sea_orm(has_many = "super::alert_config::Entity")]
    AlertConfig,
}

impl Related<super::monitor_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonitorLog.def()
    }
}

impl Related<super::alert_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertLog.def()
    }
}

impl Related<super::alert_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertConfig.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
