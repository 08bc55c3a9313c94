pub mod alert_service;
pub mod settings_service;
pub mod website_service;
