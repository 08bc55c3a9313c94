use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only check history. Rows are never updated or deleted by the core.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monitor_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub website_id: i32,
    pub status: String,
    pub response_time: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub check_time: ChronoDateTimeUtc,
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
