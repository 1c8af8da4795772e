pub mod config;
pub mod workflow;

pub use config::AppConfig;
