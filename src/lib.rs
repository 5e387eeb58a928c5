pub mod catalog;
pub mod configuration;
pub mod connectors;
pub mod gateway;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod webhooks;
