//! Domain layer - caching strategies, partitions and the worker lifecycle

pub mod cache;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod strategy;

pub use cache::{add_all, CachePartition, CacheStore, CachedEntry, PartitionKind, PartitionNames};
pub use error::DomainError;
pub use fetch::{FetchRequest, FetchResponse, Fetcher};
pub use lifecycle::{LifecycleStatus, WorkerState};
pub use strategy::{
    ResponseSource, Revalidation, Route, RoutingRules, StrategyKind, StrategyOutcome,
    StrategySelector,
};
