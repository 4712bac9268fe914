//! All-or-nothing batch population of a partition

use std::collections::HashSet;

use futures::future::try_join_all;

use super::{CachePartition, CachedEntry};
use crate::domain::fetch::{FetchRequest, Fetcher};
use crate::domain::DomainError;

/// Fetches every URL concurrently and stores the responses only if all of
/// them succeeded with a 2xx status. Nothing is written on failure.
///
/// Re-adding URLs that are already cached overwrites them, so running this
/// twice leaves one entry per URL.
pub async fn add_all(
    partition: &dyn CachePartition,
    fetcher: &dyn Fetcher,
    urls: &[String],
) -> Result<usize, DomainError> {
    let mut seen = HashSet::new();

    for url in urls {
        if !seen.insert(url.as_str()) {
            return Err(DomainError::validation(format!(
                "Duplicate URL in precache batch: {}",
                url
            )));
        }
    }

    let requests: Vec<FetchRequest> = urls.iter().map(|url| FetchRequest::get(url)).collect();

    let responses = try_join_all(requests.iter().map(|request| async move {
        let url = request.path_and_query();
        let response = fetcher
            .fetch(request)
            .await
            .map_err(|e| DomainError::precache(&url, e.to_string()))?;

        if !response.is_success() {
            return Err(DomainError::precache(
                &url,
                format!("HTTP {}", response.status()),
            ));
        }

        Ok(response)
    }))
    .await?;

    let entries: Vec<CachedEntry> = requests
        .iter()
        .zip(responses)
        .map(|(request, response)| CachedEntry::new(request, response))
        .collect();

    partition.put_entries(entries).await?;

    Ok(requests.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockPartition;
    use crate::domain::fetch::{FetchResponse, ScriptedFetcher};
    use axum::http::StatusCode;

    fn manifest() -> Vec<String> {
        vec![
            "/".to_string(),
            "/static/js/bundle.js".to_string(),
            "/manifest.json".to_string(),
        ]
    }

    fn healthy_fetcher() -> ScriptedFetcher {
        ScriptedFetcher::new()
            .with_response("/", FetchResponse::new(StatusCode::OK).with_body("<html>"))
            .with_response(
                "/static/js/bundle.js",
                FetchResponse::new(StatusCode::OK).with_body("js"),
            )
            .with_response(
                "/manifest.json",
                FetchResponse::new(StatusCode::OK).with_body("{}"),
            )
    }

    #[tokio::test]
    async fn test_add_all_stores_every_url() {
        let partition = MockPartition::new("brillprime-static-v1");
        let fetcher = healthy_fetcher();

        let added = add_all(&partition, &fetcher, &manifest()).await.unwrap();

        assert_eq!(added, 3);
        assert_eq!(partition.len().await.unwrap(), 3);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_add_all_is_all_or_nothing_on_transport_failure() {
        let partition = MockPartition::new("brillprime-static-v1");
        let fetcher = healthy_fetcher().with_failure("/manifest.json", "connection reset");

        let result = add_all(&partition, &fetcher, &manifest()).await;

        assert!(matches!(result, Err(DomainError::Precache { .. })));
        assert_eq!(partition.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_all_rejects_error_status() {
        let partition = MockPartition::new("brillprime-static-v1");
        let fetcher = healthy_fetcher()
            .with_response("/manifest.json", FetchResponse::new(StatusCode::NOT_FOUND));

        let err = add_all(&partition, &fetcher, &manifest()).await.unwrap_err();

        assert!(err.to_string().contains("/manifest.json"));
        assert_eq!(partition.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_all_leaves_nothing_when_a_write_fails() {
        let partition = MockPartition::new("brillprime-static-v1").with_failing_write(2, "quota");
        let fetcher = healthy_fetcher();

        let result = add_all(&partition, &fetcher, &manifest()).await;

        assert!(matches!(result, Err(DomainError::Cache { .. })));
        assert!(partition.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_all_restores_overwritten_entries_when_a_write_fails() {
        let shell = FetchRequest::get("/");
        let previous = FetchResponse::new(StatusCode::OK).with_body("previous shell");
        let partition = MockPartition::new("brillprime-static-v1")
            .with_entry(&shell, previous.clone())
            .with_failing_write(3, "quota");

        let result = add_all(&partition, &healthy_fetcher(), &manifest()).await;

        assert!(result.is_err());
        assert_eq!(partition.keys().await.unwrap(), vec!["GET /"]);
        assert_eq!(partition.stored(&shell), Some(previous));
    }

    #[tokio::test]
    async fn test_add_all_twice_does_not_duplicate() {
        let partition = MockPartition::new("brillprime-static-v1");
        let fetcher = healthy_fetcher();

        add_all(&partition, &fetcher, &manifest()).await.unwrap();
        add_all(&partition, &fetcher, &manifest()).await.unwrap();

        assert_eq!(partition.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_add_all_rejects_duplicates() {
        let partition = MockPartition::new("brillprime-static-v1");
        let fetcher = healthy_fetcher();
        let urls = vec!["/".to_string(), "/".to_string()];

        let result = add_all(&partition, &fetcher, &urls).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(fetcher.calls(), 0);
    }
}
