//! Infrastructure services

mod interception_service;
mod lifecycle_service;

pub use interception_service::{InterceptionService, Intercepted};
pub use lifecycle_service::{LifecycleConfig, LifecycleService, DEFAULT_PRECACHE_URLS};
