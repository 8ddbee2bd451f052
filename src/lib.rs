pub mod config;
pub mod domain;
pub mod email_client;
pub mod reminders;
pub mod startup;
pub mod storage;
pub mod telemetry;
