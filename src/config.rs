use std::env;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),
}

/// Process-level configuration from the environment. Alerting settings
/// (webhook URL, secret, enabled flag) are not here: they live in the
/// `global_config` table and are read per dispatch.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        Ok(AppConfig { database_url })
    }
}
