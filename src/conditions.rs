use std::sync::Mutex;

use tracing::warn;

/// A recoverable per-entity condition observed during an extraction pass.
///
/// Conditions never abort the pass: the affected pore or throat receives a
/// documented zero/default value and the condition is appended to the log.
/// Occlusion in particular is an expected outcome of thick fibers, not a
/// defect in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// A pore hull or throat facet was too small or collinear to process.
    DegenerateFacet { throat: Option<usize>, pore: Option<usize> },

    /// Rotated facet vertices did not collapse onto a single plane within
    /// tolerance; the mean plane was used instead.
    RotationFailure { throat: usize },

    /// The fiber radius consumed the entire throat cross-section.
    Occluded { throat: usize },

    /// Erosion split a throat cross-section into multiple channels; the
    /// throat degrades to a zero-area result.
    MultiRegionThroat { throat: usize, regions: usize },

    /// Fiber seed points fell outside the voxel grid and were dropped.
    SeedOutOfBounds { count: usize },

    /// Label dilation left voxels without a pore label.
    UnassignedVoxels { count: usize },
}

/// Append-only condition collector, safe for concurrent use from the
/// per-entity worker tasks.
#[derive(Debug, Default)]
pub(crate) struct ConditionLog {
    entries: Mutex<Vec<Condition>>,
}

impl ConditionLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a condition, emitting it as a tracing event as well.
    pub(crate) fn record(&self, condition: Condition) {
        warn!(?condition, "recoverable condition");
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(condition);
        }
    }

    /// Consumes the log and returns the recorded conditions.
    pub(crate) fn into_entries(self) -> Vec<Condition> {
        self.entries.into_inner().unwrap_or_default()
    }
}
