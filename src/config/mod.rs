pub mod app_config;

pub use app_config::{AppConfig, LogConfig, OutputConfig, OutputFormat};
