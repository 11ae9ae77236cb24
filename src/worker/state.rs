//! Worker lifecycle state

use crate::error::{B64Error, B64Result};
use crate::worker::manifest::CacheManifest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, install not started
    #[default]
    Parsed,
    /// Install event running
    Installing,
    /// Installed, waiting to activate
    Installed,
    /// Activate event running
    Activating,
    /// Serving fetches
    Activated,
    /// Install failed or replaced by a newer version
    Redundant,
}

impl WorkerState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Installing | Installed | Activating | Activated, Redundant)
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// One worker version tracked by the registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: Uuid,
    pub manifest: CacheManifest,
    pub state: WorkerState,
    pub state_changed_at: DateTime<Utc>,
}

impl WorkerRecord {
    /// New worker in the `parsed` state
    pub fn new(manifest: CacheManifest) -> Self {
        Self {
            id: Uuid::new_v4(),
            manifest,
            state: WorkerState::Parsed,
            state_changed_at: Utc::now(),
        }
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: WorkerState) -> B64Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(B64Error::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        self.state_changed_at = Utc::now();
        Ok(())
    }

    /// Name of the store this worker owns
    pub fn cache_name(&self) -> String {
        self.manifest.cache_name_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let mut worker = WorkerRecord::new(CacheManifest::default());
        for next in [
            WorkerState::Installing,
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Activated,
            WorkerState::Redundant,
        ] {
            worker.transition(next).unwrap();
            assert_eq!(worker.state, next);
        }
    }

    #[test]
    fn rejects_skipping_install() {
        let mut worker = WorkerRecord::new(CacheManifest::default());
        let err = worker.transition(WorkerState::Activated).unwrap_err();
        assert!(matches!(err, B64Error::InvalidTransition { .. }));
        assert_eq!(worker.state, WorkerState::Parsed);
    }

    #[test]
    fn redundant_is_terminal() {
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Installing));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Activated));
        assert!(!WorkerState::Parsed.can_transition_to(WorkerState::Redundant));
    }

    #[test]
    fn install_failure_goes_redundant() {
        assert!(WorkerState::Installing.can_transition_to(WorkerState::Redundant));
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&WorkerState::Activated).unwrap();
        assert_eq!(json, "\"activated\"");
    }
}
