//! Install and activation of one worker generation

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::try_join_all;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::domain::cache::{add_all, CachePartition, CacheStore, PartitionKind, PartitionNames};
use crate::domain::fetch::Fetcher;
use crate::domain::{DomainError, LifecycleStatus, WorkerState};
use crate::infrastructure::observability::{record_install, record_partitions_purged};

/// URLs precached into the static partition when none are configured
pub const DEFAULT_PRECACHE_URLS: [&str; 5] = [
    "/",
    "/static/js/bundle.js",
    "/static/css/main.css",
    "/manifest.json",
    "/offline.html",
];

/// Configuration for the lifecycle service
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub names: PartitionNames,
    pub precache_urls: Vec<String>,
    /// Take control as soon as install finishes
    pub skip_waiting: bool,
    /// Delete partitions of older generations on activation
    pub purge_stale_on_activate: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            names: PartitionNames::default(),
            precache_urls: DEFAULT_PRECACHE_URLS.iter().map(|url| url.to_string()).collect(),
            skip_waiting: true,
            purge_stale_on_activate: false,
        }
    }
}

impl LifecycleConfig {
    pub fn with_names(mut self, names: PartitionNames) -> Self {
        self.names = names;
        self
    }

    pub fn with_precache_urls(mut self, urls: Vec<String>) -> Self {
        self.precache_urls = urls;
        self
    }

    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    pub fn with_purge_stale_on_activate(mut self, purge: bool) -> Self {
        self.purge_stale_on_activate = purge;
        self
    }
}

/// Drives a generation from `Parsed` to `Activated`
#[derive(Debug)]
pub struct LifecycleService {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    config: LifecycleConfig,
    status: RwLock<LifecycleStatus>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, config: LifecycleConfig) -> Self {
        let status = LifecycleStatus::new(config.names.version(), config.skip_waiting);

        Self {
            store,
            fetcher,
            config,
            status: RwLock::new(status),
        }
    }

    pub fn names(&self) -> &PartitionNames {
        &self.config.names
    }

    pub async fn status(&self) -> LifecycleStatus {
        self.status.read().await.clone()
    }

    pub async fn state(&self) -> WorkerState {
        self.status.read().await.state
    }

    /// Whether fetches are routed through the caching strategies
    pub async fn controls_requests(&self) -> bool {
        self.state().await.controls_requests()
    }

    /// Opens the partitions and precaches the manifest while skip-waiting is
    /// requested. A population failure leaves the generation `Redundant`.
    pub async fn install(&self) -> Result<LifecycleStatus, DomainError> {
        self.transition(WorkerState::Installing).await?;

        info!(
            version = self.config.names.version(),
            urls = self.config.precache_urls.len(),
            "Installing"
        );

        let started = Instant::now();
        let (populated, skip_waiting) = tokio::join!(self.populate(), self.request_skip_waiting());

        let precached = match populated {
            Ok(precached) => precached,
            Err(e) => {
                record_install(false, 0, started.elapsed());
                error!(version = self.config.names.version(), error = %e, "Install failed");

                let mut status = self.status.write().await;
                status.state = WorkerState::Redundant;
                status.last_error = Some(e.to_string());

                return Err(e);
            }
        };

        record_install(true, precached, started.elapsed());

        {
            let mut status = self.status.write().await;
            status.state = WorkerState::Installed;
            status.installed_at = Some(Utc::now());
            status.precached = precached;
        }

        info!(version = self.config.names.version(), precached, "Installed");

        if skip_waiting {
            self.activate().await
        } else {
            info!("Waiting for activation");
            Ok(self.status().await)
        }
    }

    /// Takes control of requests. Calling it on an active generation is a no-op.
    pub async fn activate(&self) -> Result<LifecycleStatus, DomainError> {
        {
            let mut status = self.status.write().await;

            // Activated, or another caller is activating right now
            if matches!(status.state, WorkerState::Activated | WorkerState::Activating) {
                return Ok(status.clone());
            }

            Self::advance(&mut status, WorkerState::Activating)?;
        }

        let purged = if self.config.purge_stale_on_activate {
            match self.purge_stale().await {
                Ok(purged) => purged,
                Err(e) => {
                    warn!(error = %e, "Failed to purge stale partitions");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let mut status = self.status.write().await;
        status.state = WorkerState::Activated;
        status.activated_at = Some(Utc::now());
        status.purged = purged;

        info!(version = self.config.names.version(), "Activated");

        Ok(status.clone())
    }

    /// Deletes every partition with our prefix that is not a current name
    pub async fn purge_stale(&self) -> Result<Vec<String>, DomainError> {
        let names = &self.config.names;
        let mut purged = Vec::new();

        for name in self.store.names().await? {
            if names.is_owned(&name) && !names.is_current(&name) && self.store.delete(&name).await? {
                info!(partition = %name, "Purged stale partition");
                purged.push(name);
            }
        }

        record_partitions_purged(purged.len());
        Ok(purged)
    }

    async fn populate(&self) -> Result<usize, DomainError> {
        let partitions: Vec<Arc<dyn CachePartition>> =
            try_join_all(self.config.names.all().iter().map(|name| self.store.open(name))).await?;

        let static_name = self.config.names.name(PartitionKind::Static);
        let static_partition = partitions
            .iter()
            .find(|partition| partition.name() == static_name)
            .ok_or_else(|| DomainError::internal("Static partition was not opened"))?;

        add_all(
            static_partition.as_ref(),
            self.fetcher.as_ref(),
            &self.config.precache_urls,
        )
        .await
    }

    async fn request_skip_waiting(&self) -> bool {
        if self.config.skip_waiting {
            info!("Skip-waiting requested");
        }

        self.config.skip_waiting
    }

    async fn transition(&self, next: WorkerState) -> Result<(), DomainError> {
        Self::advance(&mut *self.status.write().await, next)
    }

    fn advance(status: &mut LifecycleStatus, next: WorkerState) -> Result<(), DomainError> {
        if !status.state.can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "Cannot move from {} to {}",
                status.state, next
            )));
        }

        status.state = next;
        Ok(())
    }
}
