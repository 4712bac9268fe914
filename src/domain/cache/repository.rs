//! Cache storage traits

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::CachedEntry;
use crate::domain::fetch::{FetchRequest, FetchResponse};
use crate::domain::DomainError;

/// A named, isolated store of request→response pairs
///
/// Backends implement the entry-level methods; request-level matching and
/// the `GET`-only rule live in the provided methods.
#[async_trait]
pub trait CachePartition: Send + Sync + Debug {
    /// Name the partition was opened with
    fn name(&self) -> &str;

    /// Gets the entry stored under a cache key
    async fn get_entry(&self, key: &str) -> Result<Option<CachedEntry>, DomainError>;

    /// Stores an entry, overwriting any entry with the same key
    async fn put_entry(&self, entry: CachedEntry) -> Result<(), DomainError>;

    /// Stores a batch of entries. On failure the partition is left as it was
    /// before the call.
    ///
    /// The provided version writes one entry at a time and rolls the written
    /// keys back; backends with a native multi-write override it.
    async fn put_entries(&self, entries: Vec<CachedEntry>) -> Result<(), DomainError> {
        let mut written: Vec<(String, Option<CachedEntry>)> = Vec::with_capacity(entries.len());

        for entry in entries {
            let key = entry.key().to_string();

            let result = match self.get_entry(&key).await {
                Ok(previous) => self.put_entry(entry).await.map(|_| previous),
                Err(e) => Err(e),
            };

            match result {
                Ok(previous) => written.push((key, previous)),
                Err(e) => {
                    rollback(self, written).await;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Removes the entry stored under a cache key
    async fn remove(&self, key: &str) -> Result<bool, DomainError>;

    /// Lists the cache keys currently stored
    async fn keys(&self) -> Result<Vec<String>, DomainError>;

    /// Returns the number of stored entries
    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self.keys().await?.len())
    }

    /// Looks up the response stored for a request
    async fn match_request(
        &self,
        request: &FetchRequest,
    ) -> Result<Option<FetchResponse>, DomainError> {
        let entry = self.get_entry(&request.cache_key()).await?;

        Ok(entry
            .filter(|entry| entry.matches(request))
            .map(CachedEntry::into_response))
    }

    /// Stores a response for a request, overwriting the previous one
    async fn put(&self, request: &FetchRequest, response: FetchResponse) -> Result<(), DomainError> {
        if !request.is_cacheable_method() {
            return Err(DomainError::validation(format!(
                "Only GET requests can be cached, got {}",
                request.method()
            )));
        }

        self.put_entry(CachedEntry::new(request, response)).await
    }

    /// Removes the response stored for a request
    async fn delete(&self, request: &FetchRequest) -> Result<bool, DomainError> {
        self.remove(&request.cache_key()).await
    }
}

/// Restores the keys a failed batch already wrote, newest first
async fn rollback<P>(partition: &P, written: Vec<(String, Option<CachedEntry>)>)
where
    P: CachePartition + ?Sized,
{
    for (key, previous) in written.into_iter().rev() {
        let restored = match previous {
            Some(entry) => partition.put_entry(entry).await,
            None => partition.remove(&key).await.map(|_| ()),
        };

        if let Err(e) = restored {
            warn!(partition = partition.name(), key = %key, error = %e, "Failed to roll back batch write");
        }
    }
}

/// Origin-wide registry of partitions
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Opens a partition, creating it if it does not exist
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>, DomainError>;

    /// Checks whether a partition exists
    async fn has(&self, name: &str) -> Result<bool, DomainError>;

    /// Deletes a partition and all of its entries
    async fn delete(&self, name: &str) -> Result<bool, DomainError>;

    /// Counts the entries of a partition without opening it; `0` when absent
    async fn count(&self, name: &str) -> Result<usize, DomainError>;

    /// Lists partition names
    async fn names(&self) -> Result<Vec<String>, DomainError>;
}
