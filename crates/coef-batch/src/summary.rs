use std::fmt;

use coef_core::{CoefError, SnapshotGroup};
use serde::{Deserialize, Serialize};

/// A group the driver gave up on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedGroup {
    /// Manifest position of the group.
    pub index: usize,
    /// Display label of the group.
    pub label: String,
    /// Error family (see [`CoefError::kind`]).
    pub kind: String,
    /// Stable error code.
    pub code: String,
    /// Human readable reason.
    pub message: String,
}

impl SkippedGroup {
    pub(crate) fn new(group: &SnapshotGroup, err: &CoefError) -> Self {
        Self {
            index: group.index,
            label: group.label(),
            kind: err.kind().to_string(),
            code: err.info().code.clone(),
            message: err.info().message.clone(),
        }
    }
}

/// Outcome statistics of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunSummary {
    /// Groups listed in the manifest.
    pub groups_total: usize,
    /// Groups whose coefficients were merged into the series.
    pub groups_processed: usize,
    /// Groups skipped because of per-group failures.
    pub skipped: Vec<SkippedGroup>,
    /// Entries in the final series.
    pub entries: usize,
    /// First and last time of the final series.
    pub time_range: Option<(f64, f64)>,
    /// Checkpoint files written during the run.
    pub checkpoints_written: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "groups: {} total, {} processed, {} skipped",
            self.groups_total,
            self.groups_processed,
            self.skipped.len()
        )?;
        for skipped in &self.skipped {
            writeln!(
                f,
                "  skipped #{} {}: {} ({})",
                skipped.index, skipped.label, skipped.message, skipped.kind
            )?;
        }
        match self.time_range {
            Some((first, last)) => write!(
                f,
                "series: {} entries, time {} .. {}",
                self.entries, first, last
            ),
            None => write!(f, "series: empty"),
        }
    }
}
