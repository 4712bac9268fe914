use std::time::Duration;

use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

use crate::domain::cache::PartitionNames;
use crate::domain::{DomainError, RoutingRules};
use crate::infrastructure::cache::{CacheStoreConfig, CacheType};
use crate::infrastructure::fetch::HttpFetcherConfig;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::services::{LifecycleConfig, DEFAULT_PRECACHE_URLS};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub routing: RoutingRules,
    #[serde(default)]
    pub precache: PrecacheConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// The origin server the edge sits in front of
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub backend: CacheType,
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Namespace for Redis keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Partition name prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Generation tag appended to every partition name
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    #[serde(default)]
    pub purge_stale_on_activate: bool,
    #[serde(default = "default_true")]
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrecacheConfig {
    #[serde(default = "default_precache_urls")]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token for `/admin`; the admin API is disabled when unset
    #[serde(default)]
    pub token: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_key_prefix() -> String {
    "edge".to_string()
}

fn default_prefix() -> String {
    "brillprime".to_string()
}

fn default_version() -> String {
    "v1".to_string()
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_precache_urls() -> Vec<String> {
    DEFAULT_PRECACHE_URLS.iter().map(|url| url.to_string()).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheType::default(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            prefix: default_prefix(),
            version: default_version(),
            max_capacity: default_max_capacity(),
            purge_stale_on_activate: false,
            skip_waiting: true,
        }
    }
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            urls: default_precache_urls(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name("config/default").required(false))
                .add_source(config::File::with_name("config/local").required(false))
                .add_source(
                    config::Environment::with_prefix("EDGE")
                        .separator("__")
                        .try_parsing(true)
                        .list_separator(",")
                        .with_list_parse_key("routing.image_extensions")
                        .with_list_parse_key("routing.static_prefixes")
                        .with_list_parse_key("precache.urls"),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn partition_names(&self) -> Result<PartitionNames, DomainError> {
        PartitionNames::new(&self.cache.prefix, &self.cache.version)
    }

    pub fn cache_store_config(&self) -> CacheStoreConfig {
        CacheStoreConfig {
            cache_type: self.cache.backend,
            redis_url: self.cache.redis_url.clone(),
            key_prefix: Some(self.cache.key_prefix.clone()),
            max_capacity: Some(self.cache.max_capacity),
            ..Default::default()
        }
    }

    pub fn fetcher_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig::new(&self.upstream.base_url)
            .with_timeout(Duration::from_secs(self.upstream.timeout_secs))
    }

    pub fn lifecycle_config(&self) -> Result<LifecycleConfig, DomainError> {
        Ok(LifecycleConfig::default()
            .with_names(self.partition_names()?)
            .with_precache_urls(self.precache.urls.clone())
            .with_skip_waiting(self.cache.skip_waiting)
            .with_purge_stale_on_activate(self.cache.purge_stale_on_activate))
    }

    /// Admin token, ignoring blank values
    pub fn admin_token(&self) -> Option<&str> {
        self.admin
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
