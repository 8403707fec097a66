//! Shared application concerns: configuration.

pub mod config;

pub use config::AppConfig;
