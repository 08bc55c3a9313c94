use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key-value settings shared by the whole process. The alerting keys are
/// `global_dingtalk_webhook`, `global_dingtalk_secret` (stored obfuscated,
/// see `security::secrets`) and `global_alert_enabled`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "global_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
