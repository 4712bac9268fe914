//! Redis cache store
//!
//! Each partition is a Redis hash whose fields are cache keys and whose values
//! are JSON documents. A set records the partition names.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};

use crate::domain::cache::{CachePartition, CacheStore, CachedEntry};
use crate::domain::fetch::FetchResponse;
use crate::domain::DomainError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Namespace for every key the store writes
    pub key_prefix: String,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "edge".to_string(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    fn registry_key(&self) -> String {
        format!("{}:partitions", self.key_prefix)
    }

    fn partition_key(&self, name: &str) -> String {
        format!("{}:partition:{}", self.key_prefix, name)
    }
}

/// Serialized form of a cached entry
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    #[serde(default)]
    vary: Vec<(String, Option<String>)>,
    status: u16,
    /// Header names with base64-encoded values; values need not be UTF-8
    headers: Vec<(String, String)>,
    /// Base64-encoded body
    body: String,
    stored_at: DateTime<Utc>,
}

impl From<&CachedEntry> for StoredEntry {
    fn from(entry: &CachedEntry) -> Self {
        let response = entry.response();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), BASE64.encode(value.as_bytes())))
            .collect();

        Self {
            key: entry.key().to_string(),
            vary: entry.vary().to_vec(),
            status: response.status().as_u16(),
            headers,
            body: BASE64.encode(response.body()),
            stored_at: entry.stored_at(),
        }
    }
}

impl TryFrom<StoredEntry> for CachedEntry {
    type Error = DomainError;

    fn try_from(stored: StoredEntry) -> Result<Self, Self::Error> {
        let status = StatusCode::from_u16(stored.status).map_err(|e| {
            DomainError::cache(format!("Invalid stored status {}: {}", stored.status, e))
        })?;

        let mut headers = HeaderMap::new();

        for (name, value) in &stored.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DomainError::cache(format!("Invalid stored header name: {}", e)))?;
            let value = BASE64
                .decode(value.as_bytes())
                .map_err(|e| DomainError::cache(format!("Invalid stored header value: {}", e)))
                .and_then(|bytes| {
                    HeaderValue::from_bytes(&bytes).map_err(|e| {
                        DomainError::cache(format!("Invalid stored header value: {}", e))
                    })
                })?;
            headers.append(name, value);
        }

        let body = BASE64
            .decode(stored.body.as_bytes())
            .map_err(|e| DomainError::cache(format!("Invalid stored body: {}", e)))?;

        let response = FetchResponse::new(status)
            .with_headers(headers)
            .with_body(body);

        Ok(CachedEntry::restore(
            stored.key,
            stored.vary,
            response,
            stored.stored_at,
        ))
    }
}

fn encode(entry: &CachedEntry) -> Result<String, DomainError> {
    serde_json::to_string(&StoredEntry::from(entry))
        .map_err(|e| DomainError::cache(format!("Failed to serialize cache entry: {}", e)))
}

/// One partition stored as a Redis hash
#[derive(Clone)]
pub struct RedisPartition {
    name: String,
    hash_key: String,
    connection: ConnectionManager,
}

impl fmt::Debug for RedisPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisPartition")
            .field("name", &self.name)
            .field("hash_key", &self.hash_key)
            .finish()
    }
}

#[async_trait]
impl CachePartition for RedisPartition {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_entry(&self, key: &str) -> Result<Option<CachedEntry>, DomainError> {
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn.hget(&self.hash_key, key).await.map_err(|e| {
            DomainError::cache(format!("Failed to get '{}' from {}: {}", key, self.name, e))
        })?;

        match raw {
            Some(json) => {
                let stored: StoredEntry = serde_json::from_str(&json).map_err(|e| {
                    DomainError::cache(format!("Failed to deserialize cache entry: {}", e))
                })?;
                Ok(Some(CachedEntry::try_from(stored)?))
            }
            None => Ok(None),
        }
    }

    async fn put_entry(&self, entry: CachedEntry) -> Result<(), DomainError> {
        let json = encode(&entry)?;
        let mut conn = self.connection.clone();

        let _: () = conn
            .hset(&self.hash_key, entry.key(), json)
            .await
            .map_err(|e| {
                DomainError::cache(format!(
                    "Failed to store '{}' in {}: {}",
                    entry.key(),
                    self.name,
                    e
                ))
            })?;

        Ok(())
    }

    /// One `HSET` with every field, so the batch lands or fails as a whole
    async fn put_entries(&self, entries: Vec<CachedEntry>) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Ok(());
        }

        let fields = entries
            .iter()
            .map(|entry| Ok((entry.key().to_string(), encode(entry)?)))
            .collect::<Result<Vec<(String, String)>, DomainError>>()?;
        let mut conn = self.connection.clone();

        let _: () = conn
            .hset_multiple(&self.hash_key, fields.as_slice())
            .await
            .map_err(|e| {
                DomainError::cache(format!(
                    "Failed to store {} entries in {}: {}",
                    fields.len(),
                    self.name,
                    e
                ))
            })?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: i64 = conn.hdel(&self.hash_key, key).await.map_err(|e| {
            DomainError::cache(format!("Failed to delete '{}' from {}: {}", key, self.name, e))
        })?;

        Ok(removed > 0)
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();

        conn.hkeys(&self.hash_key)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to list keys of {}: {}", self.name, e)))
    }

    async fn len(&self) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        conn.hlen(&self.hash_key)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to count {}: {}", self.name, e)))
    }
}

/// Redis-backed store, shared by every edge instance pointing at the same server
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCacheStore {
    /// Connects to Redis
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| DomainError::cache("Timed out connecting to Redis"))?
        .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>, DomainError> {
        let mut conn = self.connection.clone();

        let _: i64 = conn
            .sadd(self.config.registry_key(), name)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to register '{}': {}", name, e)))?;

        Ok(Arc::new(RedisPartition {
            name: name.to_string(),
            hash_key: self.config.partition_key(name),
            connection: self.connection.clone(),
        }))
    }

    async fn has(&self, name: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        conn.sismember(self.config.registry_key(), name)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to look up '{}': {}", name, e)))
    }

    async fn delete(&self, name: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let _: i64 = conn
            .del(self.config.partition_key(name))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete '{}': {}", name, e)))?;

        let removed: i64 = conn
            .srem(self.config.registry_key(), name)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to unregister '{}': {}", name, e)))?;

        Ok(removed > 0)
    }

    async fn count(&self, name: &str) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        conn.hlen(self.config.partition_key(name))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to count '{}': {}", name, e)))
    }

    async fn names(&self) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();

        let mut names: Vec<String> = conn
            .smembers(self.config.registry_key())
            .await
            .map_err(|e| DomainError::cache(format!("Failed to list partitions: {}", e)))?;

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fetch::FetchRequest;
    use axum::http::header;

    // Tests marked #[ignore] need a running Redis instance
    // Run with: cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("edge-test")
    }

    #[test]
    fn test_key_layout() {
        let config = RedisCacheConfig::default().with_key_prefix("edge");

        assert_eq!(config.registry_key(), "edge:partitions");
        assert_eq!(
            config.partition_key("brillprime-static-v1"),
            "edge:partition:brillprime-static-v1"
        );
    }

    #[test]
    fn test_stored_entry_preserves_binary_body_and_vary() {
        let request = FetchRequest::get("/img/logo.png")
            .with_header(header::ACCEPT, HeaderValue::from_static("image/webp"));
        let response = FetchResponse::new(StatusCode::OK)
            .with_header(header::VARY, HeaderValue::from_static("Accept"))
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))
            .with_header(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_bytes(b"attachment; filename=\"caf\xe9.png\"").unwrap(),
            )
            .with_body(vec![0x89, b'P', b'N', b'G', 0x00, 0xff]);
        let entry = CachedEntry::new(&request, response.clone());

        let json = serde_json::to_string(&StoredEntry::from(&entry)).unwrap();
        let stored: StoredEntry = serde_json::from_str(&json).unwrap();
        let restored = CachedEntry::try_from(stored).unwrap();

        assert_eq!(restored.response(), &response);
        assert!(restored.matches(&request));
        assert_eq!(restored.stored_at(), entry.stored_at());
    }

    #[test]
    fn test_corrupt_body_is_rejected() {
        let stored = StoredEntry {
            key: "GET /".to_string(),
            vary: Vec::new(),
            status: 200,
            headers: Vec::new(),
            body: "not base64!".to_string(),
            stored_at: Utc::now(),
        };

        assert!(CachedEntry::try_from(stored).is_err());
    }

    #[test]
    fn test_plain_text_header_value_is_rejected() {
        let stored = StoredEntry {
            key: "GET /".to_string(),
            vary: Vec::new(),
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: String::new(),
            stored_at: Utc::now(),
        };

        assert!(CachedEntry::try_from(stored).is_err());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_put_and_match() {
        let store = RedisCacheStore::new(get_test_config()).await.unwrap();
        let partition = store.open("brillprime-dynamic-test").await.unwrap();
        let request = FetchRequest::get("/api/products");
        let response = FetchResponse::new(StatusCode::OK).with_body("[]");

        partition.put(&request, response.clone()).await.unwrap();

        assert_eq!(
            partition.match_request(&request).await.unwrap(),
            Some(response)
        );

        // Cleanup
        store.delete("brillprime-dynamic-test").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_put_entries_and_count() {
        let store = RedisCacheStore::new(get_test_config()).await.unwrap();
        let partition = store.open("brillprime-static-batch-test").await.unwrap();
        let entries = ["/", "/manifest.json"]
            .iter()
            .map(|url| {
                CachedEntry::new(&FetchRequest::get(url), FetchResponse::new(StatusCode::OK))
            })
            .collect();

        partition.put_entries(entries).await.unwrap();

        assert_eq!(store.count("brillprime-static-batch-test").await.unwrap(), 2);

        store.delete("brillprime-static-batch-test").await.unwrap();
        assert_eq!(store.count("brillprime-static-batch-test").await.unwrap(), 0);
        assert!(!store.has("brillprime-static-batch-test").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete_partition() {
        let store = RedisCacheStore::new(get_test_config()).await.unwrap();
        let partition = store.open("brillprime-static-test").await.unwrap();
        partition
            .put(&FetchRequest::get("/"), FetchResponse::new(StatusCode::OK))
            .await
            .unwrap();

        assert!(store.has("brillprime-static-test").await.unwrap());
        assert!(store.delete("brillprime-static-test").await.unwrap());
        assert!(!store.has("brillprime-static-test").await.unwrap());
    }
}
