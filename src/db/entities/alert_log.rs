use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of webhook delivery attempts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alert_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub website_id: i32,
    /// `down` or `up`.
    pub alert_type: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// `success` or `failed`.
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub sent_at: ChronoDateTimeUtc,
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
