//! Cache domain - partitions, entries and their naming

mod entry;
mod partition;
mod precache;
mod repository;

pub use entry::CachedEntry;
pub use partition::{PartitionKind, PartitionNames};
pub use precache::add_all;
pub use repository::{CachePartition, CacheStore};

#[cfg(test)]
pub use repository::mock::MockPartition;
