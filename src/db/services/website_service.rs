//! Read/write operations on websites and their check history.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{monitor_log, website};
use crate::db::enums::CheckStatus;
use crate::db::store::CheckTransition;
use crate::monitor::prober::ProbeOutcome;

pub async fn get_website(
    db: &DatabaseConnection,
    website_id: i32,
) -> Result<Option<website::Model>, DbErr> {
    website::Entity::find_by_id(website_id).one(db).await
}

pub async fn list_websites(db: &DatabaseConnection) -> Result<Vec<website::Model>, DbErr> {
    website::Entity::find()
        .order_by_asc(website::Column::Id)
        .all(db)
        .await
}

/// Commits one check result: updates the website's status fields and appends
/// a `monitor_logs` row in a single transaction.
///
/// The previous status is re-read inside the transaction, so the returned
/// transition reflects what was actually persisted at commit time rather
/// than whatever the caller saw before its probe ran. Returns `None` when
/// the website was deleted while the check was in flight.
pub async fn record_check_result(
    db: &DatabaseConnection,
    website_id: i32,
    outcome: &ProbeOutcome,
    checked_at: DateTime<Utc>,
) -> Result<Option<CheckTransition>, DbErr> {
    let txn = db.begin().await?;

    let Some(current) = website::Entity::find_by_id(website_id).one(&txn).await? else {
        txn.rollback().await?;
        return Ok(None);
    };
    let old_status = current.status.as_deref().map(CheckStatus::parse);

    let mut active: website::ActiveModel = current.into_active_model();
    active.status = Set(Some(outcome.status.as_str().to_owned()));
    active.last_check = Set(Some(checked_at));
    active.response_time = Set(outcome.response_time);
    active.update(&txn).await?;

    let log = monitor_log::ActiveModel {
        website_id: Set(website_id),
        status: Set(outcome.status.as_str().to_owned()),
        response_time: Set(outcome.response_time),
        error_message: Set(outcome.error.clone()),
        check_time: Set(checked_at),
        ..Default::default()
    };
    log.insert(&txn).await?;

    txn.commit().await?;

    Ok(Some(CheckTransition {
        old_status,
        new_status: outcome.status,
    }))
}

/// Recent check history for a website, newest first.
pub async fn recent_logs(
    db: &DatabaseConnection,
    website_id: i32,
    limit: u64,
) -> Result<Vec<monitor_log::Model>, DbErr> {
    use sea_orm::QuerySelect;

    monitor_log::Entity::find()
        .filter(monitor_log::Column::WebsiteId.eq(website_id))
        .order_by_desc(monitor_log::Column::CheckTime)
        .limit(limit)
        .all(db)
        .await
}
