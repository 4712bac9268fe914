//! Partition naming and generations

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// The four partitions a worker generation owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    /// App shell and bundled assets
    Static,
    /// API and fallback responses
    Dynamic,
    Images,
    /// Version marker for the deploy, holds no entries
    Umbrella,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 4] = [
        PartitionKind::Static,
        PartitionKind::Dynamic,
        PartitionKind::Images,
        PartitionKind::Umbrella,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Images => "images",
            PartitionKind::Umbrella => "umbrella",
        }
    }
}

impl std::fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Produces stable partition names for one deploy generation
///
/// Names embed the version token, so a new deploy gets fresh partitions and
/// the previous generation's partitions are left behind untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    prefix: String,
    version: String,
}

impl Default for PartitionNames {
    fn default() -> Self {
        Self {
            prefix: "brillprime".to_string(),
            version: "v1".to_string(),
        }
    }
}

impl PartitionNames {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Result<Self, DomainError> {
        let prefix = prefix.into();
        let version = version.into();

        for (field, value) in [("prefix", &prefix), ("version", &version)] {
            if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == ':') {
                return Err(DomainError::configuration(format!(
                    "Invalid partition {}: '{}'",
                    field, value
                )));
            }
        }

        Ok(Self { prefix, version })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self, kind: PartitionKind) -> String {
        match kind {
            PartitionKind::Umbrella => format!("{}-{}", self.prefix, self.version),
            other => format!("{}-{}-{}", self.prefix, other.as_str(), self.version),
        }
    }

    pub fn all(&self) -> Vec<String> {
        PartitionKind::ALL.iter().map(|kind| self.name(*kind)).collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<PartitionKind> {
        PartitionKind::ALL
            .into_iter()
            .find(|kind| self.name(*kind) == name)
    }

    /// One of this generation's names
    pub fn is_current(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }

    /// Carries our prefix, whatever the generation
    pub fn is_owned(&self, name: &str) -> bool {
        name.starts_with(&format!("{}-", self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = PartitionNames::default();

        assert_eq!(names.name(PartitionKind::Static), "brillprime-static-v1");
        assert_eq!(names.name(PartitionKind::Dynamic), "brillprime-dynamic-v1");
        assert_eq!(names.name(PartitionKind::Images), "brillprime-images-v1");
        assert_eq!(names.name(PartitionKind::Umbrella), "brillprime-v1");
        assert_eq!(names.all().len(), 4);
    }

    #[test]
    fn test_new_version_yields_fresh_names() {
        let v1 = PartitionNames::default();
        let v2 = PartitionNames::new("brillprime", "v2").unwrap();

        for kind in PartitionKind::ALL {
            assert_ne!(v1.name(kind), v2.name(kind));
        }
        assert!(!v2.is_current("brillprime-static-v1"));
        assert!(v2.is_owned("brillprime-static-v1"));
        assert!(!v2.is_owned("other-app-static-v1"));
    }

    #[test]
    fn test_kind_of() {
        let names = PartitionNames::default();

        assert_eq!(names.kind_of("brillprime-images-v1"), Some(PartitionKind::Images));
        assert_eq!(names.kind_of("brillprime-v1"), Some(PartitionKind::Umbrella));
        assert_eq!(names.kind_of("brillprime-images-v0"), None);
    }

    #[test]
    fn test_rejects_invalid_tokens() {
        assert!(PartitionNames::new("", "v1").is_err());
        assert!(PartitionNames::new("brill prime", "v1").is_err());
        assert!(PartitionNames::new("brillprime", "v:1").is_err());
    }
}
