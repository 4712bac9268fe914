//! In-memory cache store using moka

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{CachePartition, CacheStore, CachedEntry};
use crate::domain::DomainError;

/// Configuration for in-memory partitions
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries per partition; the oldest and least used
    /// entries are evicted past this bound
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl InMemoryCacheConfig {
    /// Sets the per-partition capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// One partition backed by a moka cache
///
/// Entries have no time-to-live. Capacity-bound eviction is the only way an
/// entry leaves besides an explicit delete.
#[derive(Debug)]
pub struct InMemoryPartition {
    name: String,
    entries: MokaCache<String, CachedEntry>,
}

impl InMemoryPartition {
    fn new(name: &str, config: &InMemoryCacheConfig) -> Self {
        Self {
            name: name.to_string(),
            entries: MokaCache::builder()
                .name(name)
                .max_capacity(config.max_capacity)
                .build(),
        }
    }
}

#[async_trait]
impl CachePartition for InMemoryPartition {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_entry(&self, key: &str) -> Result<Option<CachedEntry>, DomainError> {
        Ok(self.entries.get(key).await)
    }

    async fn put_entry(&self, entry: CachedEntry) -> Result<(), DomainError> {
        self.entries.insert(entry.key().to_string(), entry).await;
        Ok(())
    }

    async fn put_entries(&self, entries: Vec<CachedEntry>) -> Result<(), DomainError> {
        for entry in entries {
            self.entries.insert(entry.key().to_string(), entry).await;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.entries.remove(key).await.is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        self.entries.run_pending_tasks().await;

        Ok(self
            .entries
            .iter()
            .map(|(key, _)| key.as_ref().clone())
            .collect())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        self.entries.run_pending_tasks().await;
        Ok(self.entries.entry_count() as usize)
    }
}

/// Thread-safe registry of in-memory partitions
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    partitions: RwLock<HashMap<String, Arc<InMemoryPartition>>>,
    config: InMemoryCacheConfig,
}

impl InMemoryCacheStore {
    /// Creates a new store with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new store with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            config,
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>, DomainError> {
        let mut partitions = self.partitions.write().map_err(|e| {
            DomainError::cache(format!("Failed to acquire write lock: {}", e))
        })?;

        let partition: Arc<dyn CachePartition> = partitions
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryPartition::new(name, &self.config)))
            .clone();

        Ok(partition)
    }

    async fn has(&self, name: &str) -> Result<bool, DomainError> {
        let partitions = self.partitions.read().map_err(|e| {
            DomainError::cache(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(partitions.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, DomainError> {
        let removed = {
            let mut partitions = self.partitions.write().map_err(|e| {
                DomainError::cache(format!("Failed to acquire write lock: {}", e))
            })?;
            partitions.remove(name)
        };

        // Handles still held by in-flight requests must not see stale entries
        if let Some(partition) = &removed {
            partition.entries.invalidate_all();
        }

        Ok(removed.is_some())
    }

    async fn count(&self, name: &str) -> Result<usize, DomainError> {
        let partition = {
            let partitions = self.partitions.read().map_err(|e| {
                DomainError::cache(format!("Failed to acquire read lock: {}", e))
            })?;
            partitions.get(name).cloned()
        };

        match partition {
            Some(partition) => partition.len().await,
            None => Ok(0),
        }
    }

    async fn names(&self) -> Result<Vec<String>, DomainError> {
        let partitions = self.partitions.read().map_err(|e| {
            DomainError::cache(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut names: Vec<String> = partitions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
