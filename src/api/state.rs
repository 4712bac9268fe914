//! Application state for shared services

use std::sync::Arc;

use crate::api::middleware::AdminToken;
use crate::domain::cache::CacheStore;
use crate::infrastructure::services::{InterceptionService, LifecycleService};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub interception: Arc<InterceptionService>,
    pub lifecycle: Arc<LifecycleService>,
    pub store: Arc<dyn CacheStore>,
    /// `None` disables the admin API
    pub admin_token: Option<Arc<AdminToken>>,
}

impl AppState {
    pub fn new(
        interception: Arc<InterceptionService>,
        lifecycle: Arc<LifecycleService>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            interception,
            lifecycle,
            store,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(Arc::new(AdminToken::new(token)));
        self
    }
}
