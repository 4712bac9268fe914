use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{FetchRequest, FetchResponse};
use crate::domain::DomainError;

/// The network side of every strategy
///
/// `Err` is reserved for transport failures (offline, DNS, connection reset,
/// client timeout). Any HTTP status, 4xx and 5xx included, is an `Ok` response.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, RwLock};
    use std::time::Duration;

    /// Behaviour scripted for a single URL
    #[derive(Debug, Clone)]
    pub enum Scripted {
        Respond(FetchResponse),
        Fail(String),
        /// Never settles
        Hang,
        Delayed(Duration, FetchResponse),
        DelayedFail(Duration, String),
    }

    /// Fetcher fake keyed by origin-relative URL, with a call log
    #[derive(Debug, Default)]
    pub struct ScriptedFetcher {
        routes: RwLock<HashMap<String, Scripted>>,
        calls: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(self, url: &str, scripted: Scripted) -> Self {
            self.routes
                .write()
                .unwrap()
                .insert(url.to_string(), scripted);
            self
        }

        pub fn with_response(self, url: &str, response: FetchResponse) -> Self {
            self.with(url, Scripted::Respond(response))
        }

        pub fn with_failure(self, url: &str, error: impl Into<String>) -> Self {
            self.with(url, Scripted::Fail(error.into()))
        }

        /// Replaces the behaviour for a URL after construction
        pub fn script(&self, url: &str, scripted: Scripted) {
            self.routes
                .write()
                .unwrap()
                .insert(url.to_string(), scripted);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, DomainError> {
            let url = request.path_and_query();
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(url.clone());

            let scripted = self.routes.read().unwrap().get(&url).cloned();

            match scripted {
                Some(Scripted::Respond(response)) => Ok(response),
                Some(Scripted::Fail(error)) => Err(DomainError::transport(error)),
                Some(Scripted::Hang) => futures::future::pending().await,
                Some(Scripted::Delayed(delay, response)) => {
                    tokio::time::sleep(delay).await;
                    Ok(response)
                }
                Some(Scripted::DelayedFail(delay, error)) => {
                    tokio::time::sleep(delay).await;
                    Err(DomainError::transport(error))
                }
                None => Err(DomainError::transport(format!(
                    "no route scripted for {}",
                    url
                ))),
            }
        }
    }
}
