//! Global key-value configuration.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};

use crate::db::entities::global_config;

/// Retrieves a setting value by its key.
pub async fn get_value(db: &DatabaseConnection, key: &str) -> Result<Option<String>, DbErr> {
    let row = global_config::Entity::find_by_id(key.to_owned()).one(db).await?;
    Ok(row.map(|r| r.value))
}

/// Creates or updates a setting.
pub async fn set_value(db: &DatabaseConnection, key: &str, value: &str) -> Result<(), DbErr> {
    let active = global_config::ActiveModel {
        key: Set(key.to_owned()),
        value: Set(value.to_owned()),
        updated_at: Set(Utc::now()),
    };
    global_config::Entity::insert(active)
        .on_conflict(
            OnConflict::column(global_config::Column::Key)
                .update_columns([
                    global_config::Column::Value,
                    global_config::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}
