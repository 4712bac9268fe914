//! Request classification

use serde::{Deserialize, Serialize};

use crate::domain::cache::PartitionKind;

/// The three request-fulfilment algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::NetworkFirst => "network_first",
            StrategyKind::CacheFirst => "cache_first",
            StrategyKind::StaleWhileRevalidate => "stale_while_revalidate",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a request goes: which strategy, against which partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub strategy: StrategyKind,
    pub partition: PartitionKind,
}

impl Route {
    pub const fn new(strategy: StrategyKind, partition: PartitionKind) -> Self {
        Self {
            strategy,
            partition,
        }
    }
}

/// URL patterns driving classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRules {
    /// Paths starting with this go network-first to the dynamic partition
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Extensions (without the dot) served cache-first from the image partition
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Served stale-while-revalidate from the static partition.
    /// `/` matches only the root itself; every other entry is a prefix.
    #[serde(default = "default_static_prefixes")]
    pub static_prefixes: Vec<String>,
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_static_prefixes() -> Vec<String> {
    ["/", "/static/", "/assets/", "/favicon"]
        .iter()
        .map(|prefix| prefix.to_string())
        .collect()
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            image_extensions: default_image_extensions(),
            static_prefixes: default_static_prefixes(),
        }
    }
}

/// Classifies requests by URL path; a pure function of the path
#[derive(Debug, Clone)]
pub struct StrategySelector {
    rules: RoutingRules,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(RoutingRules::default())
    }
}

impl StrategySelector {
    pub fn new(mut rules: RoutingRules) -> Self {
        rules.image_extensions = rules
            .image_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self { rules }
    }

    pub fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    /// First match wins: API prefix, image extension, static prefix, fallback
    pub fn classify(&self, path: &str) -> Route {
        let path = path.split_once('?').map_or(path, |(path, _)| path);

        if !self.rules.api_prefix.is_empty() && path.starts_with(&self.rules.api_prefix) {
            return Route::new(StrategyKind::NetworkFirst, PartitionKind::Dynamic);
        }

        if self.is_image(path) {
            return Route::new(StrategyKind::CacheFirst, PartitionKind::Images);
        }

        if self.is_static(path) {
            return Route::new(StrategyKind::StaleWhileRevalidate, PartitionKind::Static);
        }

        Route::new(StrategyKind::NetworkFirst, PartitionKind::Dynamic)
    }

    fn is_image(&self, path: &str) -> bool {
        match extension(path) {
            Some(ext) => self
                .rules
                .image_extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    fn is_static(&self, path: &str) -> bool {
        self.rules.static_prefixes.iter().any(|prefix| {
            if prefix == "/" {
                path == "/"
            } else {
                path.starts_with(prefix.as_str())
            }
        })
    }
}

/// Extension of the last path segment
fn extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);

    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> StrategySelector {
        StrategySelector::default()
    }

    #[test]
    fn test_api_is_network_first() {
        let route = selector().classify("/api/orders/42");

        assert_eq!(route.strategy, StrategyKind::NetworkFirst);
        assert_eq!(route.partition, PartitionKind::Dynamic);
    }

    #[test]
    fn test_api_prefix_wins_over_image_extension() {
        let route = selector().classify("/api/merchants/7/logo.png");

        assert_eq!(route.strategy, StrategyKind::NetworkFirst);
    }

    #[test]
    fn test_images_are_cache_first() {
        for path in [
            "/images/products/rice.jpg",
            "/static/media/logo.svg",
            "/avatar.PNG",
            "/favicon.ico",
        ] {
            let route = selector().classify(path);
            assert_eq!(route.strategy, StrategyKind::CacheFirst, "{}", path);
            assert_eq!(route.partition, PartitionKind::Images, "{}", path);
        }
    }

    #[test]
    fn test_static_is_stale_while_revalidate() {
        for path in [
            "/",
            "/static/js/bundle.js",
            "/assets/fonts/inter.woff2",
            "/favicon-32.txt",
        ] {
            let route = selector().classify(path);
            assert_eq!(route.strategy, StrategyKind::StaleWhileRevalidate, "{}", path);
            assert_eq!(route.partition, PartitionKind::Static, "{}", path);
        }
    }

    #[test]
    fn test_root_entry_matches_exactly() {
        let route = selector().classify("/merchants/nearby");

        assert_eq!(
            route,
            Route::new(StrategyKind::NetworkFirst, PartitionKind::Dynamic)
        );
    }

    #[test]
    fn test_query_is_ignored() {
        assert_eq!(
            selector().classify("/images/a.png?w=200").strategy,
            StrategyKind::CacheFirst
        );
    }

    #[test]
    fn test_dot_segments_are_not_extensions() {
        assert_eq!(extension("/.png"), None);
        assert_eq!(extension("/images/"), None);
        assert_eq!(extension("/v1.2/orders"), None);
        assert_eq!(extension("/a/b.webp"), Some("webp"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let selector = selector();
        let paths = [
            "/",
            "/api/wallet",
            "/img/x.gif",
            "/assets/app.css",
            "/checkout",
            "",
        ];

        for path in paths {
            let first = selector.classify(path);
            for _ in 0..10 {
                assert_eq!(selector.classify(path), first);
            }
        }
    }

    #[test]
    fn test_custom_rules_are_normalized() {
        let selector = StrategySelector::new(RoutingRules {
            api_prefix: "/v2/".to_string(),
            image_extensions: vec![".AVIF".to_string()],
            static_prefixes: vec!["/public/".to_string()],
        });

        assert_eq!(selector.rules().image_extensions, vec!["avif"]);
        assert_eq!(selector.classify("/v2/users").strategy, StrategyKind::NetworkFirst);
        assert_eq!(selector.classify("/pics/a.avif").strategy, StrategyKind::CacheFirst);
        assert_eq!(
            selector.classify("/public/app.js").strategy,
            StrategyKind::StaleWhileRevalidate
        );
        assert_eq!(selector.classify("/").strategy, StrategyKind::NetworkFirst);
    }
}
