//! Fetch primitives - the request/response pair every strategy works on

mod fetcher;
mod request;
mod response;

pub use fetcher::Fetcher;
pub use request::FetchRequest;
pub use response::{FetchResponse, IMAGE_UNAVAILABLE_BODY, OFFLINE_BODY};

#[cfg(test)]
pub use fetcher::mock::{Scripted, ScriptedFetcher};
#[cfg(test)]
pub use fetcher::MockFetcher;
