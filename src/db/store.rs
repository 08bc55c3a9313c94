//! Persistence boundary used by the scheduler and the alert dispatcher.
//!
//! Both components talk to a [`MonitorStore`] trait object instead of a
//! concrete database handle, so the check/alert pipeline can be exercised
//! against an in-memory store in tests while production runs on [`DbStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;

use crate::db::entities::website;
use crate::db::enums::{AlertKind, CheckStatus, DeliveryOutcome};
use crate::db::services::{alert_service, settings_service, website_service};
use crate::monitor::prober::ProbeOutcome;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Status change observed when a check result was committed. `old_status` is
/// the value that was persisted immediately before the commit, which may
/// differ from whatever the caller read before probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTransition {
    pub old_status: Option<CheckStatus>,
    pub new_status: CheckStatus,
}

/// One alert delivery attempt, ready to append to the alert history.
#[derive(Debug, Clone)]
pub struct NewAlertLog {
    pub website_id: i32,
    pub kind: AlertKind,
    pub message: String,
    pub outcome: DeliveryOutcome,
    pub error: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[async_trait]
pub trait MonitorStore: Send + Sync {
    async fn website(&self, website_id: i32) -> Result<Option<website::Model>, StoreError>;

    /// All registered websites, used to (re)install check tasks at startup.
    async fn all_websites(&self) -> Result<Vec<website::Model>, StoreError>;

    /// Atomically persists a check result (website status fields + one
    /// history row) and reports the transition, or `None` when the website
    /// no longer exists.
    async fn commit_check(
        &self,
        website_id: i32,
        outcome: &ProbeOutcome,
        checked_at: DateTime<Utc>,
    ) -> Result<Option<CheckTransition>, StoreError>;

    /// Per-website alerting switch; `None` means no row, which callers must
    /// treat as enabled.
    async fn alert_enabled_for(&self, website_id: i32) -> Result<Option<bool>, StoreError>;

    async fn global_value(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn record_alert(&self, entry: NewAlertLog) -> Result<(), StoreError>;
}

/// Production store backed by SeaORM.
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl MonitorStore for DbStore {
    async fn website(&self, website_id: i32) -> Result<Option<website::Model>, StoreError> {
        Ok(website_service::get_website(&self.db, website_id).await?)
    }

    async fn all_websites(&self) -> Result<Vec<website::Model>, StoreError> {
        Ok(website_service::list_websites(&self.db).await?)
    }

    async fn commit_check(
        &self,
        website_id: i32,
        outcome: &ProbeOutcome,
        checked_at: DateTime<Utc>,
    ) -> Result<Option<CheckTransition>, StoreError> {
        Ok(website_service::record_check_result(&self.db, website_id, outcome, checked_at).await?)
    }

    async fn alert_enabled_for(&self, website_id: i32) -> Result<Option<bool>, StoreError> {
        Ok(alert_service::alert_enabled_for(&self.db, website_id).await?)
    }

    async fn global_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(settings_service::get_value(&self.db, key).await?)
    }

    async fn record_alert(&self, entry: NewAlertLog) -> Result<(), StoreError> {
        Ok(alert_service::record_alert(&self.db, entry).await?)
    }
}
