//! Reconstructs a saved window layout by matching live windows or
//! relaunching processes, then placing each window on its recorded
//! virtual desktop.

mod engine;

pub use engine::{ReplayEngine, ReplayOptions};

use serde::{Deserialize, Serialize};

use crate::models::ConfigId;

/// Why a single record could not be restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    /// Executable missing, not runnable, or it exited without opening a
    /// window.
    LaunchFailed(String),
    /// The OS refused the window move. The process keeps running.
    PlacementDenied(String),
}

/// Terminal state of one record after a replay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordOutcome {
    /// Not attempted; the run was cancelled before this record.
    Pending,
    /// A live window already matched, so no relaunch was needed.
    MatchedExisting,
    /// Relaunched and moved onto the target desktop.
    Placed,
    Failed(FailureReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReport {
    pub title: String,
    pub executable_path: String,
    pub outcome: RecordOutcome,
}

/// Per-record outcomes of one replay run, in the configuration's stored
/// order. Never a single pass/fail: callers inspect the entries to tell a
/// full restore from a partial one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub config_id: ConfigId,
    pub records: Vec<RecordReport>,
}

impl ReplayReport {
    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Failed(_)))
            .count()
    }

    pub fn fully_restored(&self) -> bool {
        self.records.iter().all(|r| {
            matches!(
                r.outcome,
                RecordOutcome::Placed | RecordOutcome::MatchedExisting
            )
        })
    }
}
