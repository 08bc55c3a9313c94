//! SeaORM entities mapping the monitoring tables.

pub mod alert_config;
pub mod alert_log;
pub mod global_config;
pub mod monitor_log;
pub mod website;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::website::Entity as Website;
    pub use super::website::Model as WebsiteModel;
    pub use super::website::ActiveModel as WebsiteActiveModel;
    pub use super::website::Column as WebsiteColumn;

    pub use super::monitor_log::Entity as MonitorLog;
    pub use super::monitor_log::Model as MonitorLogModel;
    pub use super::monitor_log::ActiveModel as MonitorLogActiveModel;
    pub use super::monitor_log::Column as MonitorLogColumn;

    pub use super::alert_config::Entity as AlertConfig;
    pub use super::alert_config::Model as AlertConfigModel;
    pub use super::alert_config::ActiveModel as AlertConfigActiveModel;
    pub use super::alert_config::Column as AlertConfigColumn;

    pub use super::alert_log::Entity as AlertLog;
    pub use super::alert_log::Model as AlertLogModel;
    pub use super::alert_log::ActiveModel as AlertLogActiveModel;
    pub use super::alert_log::Column as AlertLogColumn;

    pub use super::global_config::Entity as GlobalConfig;
    pub use super::global_config::Model as GlobalConfigModel;
    pub use super::global_config::ActiveModel as GlobalConfigActiveModel;
    pub use super::global_config::Column as GlobalConfigColumn;
}
