use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-website alerting switch. Absence of a row means alerting is enabled.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alert_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub website_id: i32,
    pub alert_enabled: bool,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::website::Entity",
        from = "Column::WebsiteId",
        to = "super::website::Column::Id",
        on_delete = "Cascade"
    )]
    Website,
}

impl Related<super::website::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Website.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
