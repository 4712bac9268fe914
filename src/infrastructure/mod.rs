//! Infrastructure layer - cache backends, the upstream client and services

pub mod cache;
pub mod fetch;
pub mod logging;
pub mod observability;
pub mod services;
