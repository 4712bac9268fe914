//! Worker generation lifecycle

use chrono::{DateTime, Utc};
use serde::Serialize;

/// State of one worker generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting to take over
    Installed,
    Activating,
    Activated,
    /// Install failed; this generation never takes control
    Redundant,
}

impl WorkerState {
    /// Only an activated generation intercepts requests
    pub fn controls_requests(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;

        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installing, Redundant)
                | (Installed, Activating)
                | (Activating, Activated)
        )
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of a generation, as reported by the admin API
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleStatus {
    pub version: String,
    pub state: WorkerState,
    pub skip_waiting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    pub precached: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub purged: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl LifecycleStatus {
    pub fn new(version: impl Into<String>, skip_waiting: bool) -> Self {
        Self {
            version: version.into(),
            state: WorkerState::Parsed,
            skip_waiting,
            installed_at: None,
            activated_at: None,
            precached: 0,
            purged: Vec::new(),
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            WorkerState::Parsed,
            WorkerState::Installing,
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Activated,
        ];

        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_redundant_is_terminal() {
        assert!(WorkerState::Installing.can_transition_to(WorkerState::Redundant));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Installing));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Activating));
    }

    #[test]
    fn test_cannot_skip_install() {
        assert!(!WorkerState::Parsed.can_transition_to(WorkerState::Activating));
        assert!(!WorkerState::Activated.can_transition_to(WorkerState::Installing));
    }

    #[test]
    fn test_only_activated_controls_requests() {
        assert!(WorkerState::Activated.controls_requests());
        assert!(!WorkerState::Installed.controls_requests());
        assert!(!WorkerState::Redundant.controls_requests());
    }

    #[test]
    fn test_status_serialization() {
        let status = LifecycleStatus::new("v3", true);
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["state"], "parsed");
        assert_eq!(json["version"], "v3");
        assert!(json.get("purged").is_none());
    }
}
