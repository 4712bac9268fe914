//! Cache infrastructure - partition store backends

mod factory;
mod in_memory;
mod redis;

pub use factory::{CacheStoreConfig, CacheStoreFactory, CacheType};
pub use in_memory::{InMemoryCacheConfig, InMemoryCacheStore, InMemoryPartition};
pub use redis::{RedisCacheConfig, RedisCacheStore, RedisPartition};
