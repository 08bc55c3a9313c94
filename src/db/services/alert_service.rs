//! Per-website alert configuration reads and alert history writes.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::entities::{alert_config, alert_log};
use crate::db::store::NewAlertLog;

/// Returns the website's alerting switch, or `None` when no row exists.
/// Callers treat the absent row as "enabled" (the default-on policy).
pub async fn alert_enabled_for(
    db: &DatabaseConnection,
    website_id: i32,
) -> Result<Option<bool>, DbErr> {
    let config = alert_config::Entity::find()
        .filter(alert_config::Column::WebsiteId.eq(website_id))
        .one(db)
        .await?;
    Ok(config.map(|c| c.alert_enabled))
}

/// Appends one delivery-attempt record.
pub async fn record_alert(db: &DatabaseConnection, entry: NewAlertLog) -> Result<(), DbErr> {
    let log = alert_log::ActiveModel {
        website_id: Set(entry.website_id),
        alert_type: Set(entry.kind.as_str().to_owned()),
        message: Set(entry.message),
        status: Set(entry.outcome.as_str().to_owned()),
        error_message: Set(entry.error),
        sent_at: Set(entry.sent_at),
        ..Default::default()
    };
    log.insert(db).await?;
    Ok(())
}

/// Alert history for a website, newest first.
pub async fn recent_alerts(
    db: &DatabaseConnection,
    website_id: i32,
    limit: u64,
) -> Result<Vec<alert_log::Model>, DbErr> {
    use sea_orm::QuerySelect;

    alert_log::Entity::find()
        .filter(alert_log::Column::WebsiteId.eq(website_id))
        .order_by_desc(alert_log::Column::SentAt)
        .limit(limit)
        .all(db)
        .await
}
