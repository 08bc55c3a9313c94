pub mod alerting;
pub mod config;
pub mod db;
pub mod logging;
pub mod monitor;
pub mod security;
