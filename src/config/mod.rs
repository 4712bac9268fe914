//! Application configuration

mod app_config;

pub use app_config::{
    AdminConfig, AppConfig, CacheSettings, LogFormat, LoggingConfig, PrecacheConfig,
    ServerConfig, UpstreamConfig,
};
