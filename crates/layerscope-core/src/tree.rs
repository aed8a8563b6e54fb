//! Walked layer container.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LayerWarning;
use crate::layer::Layer;
use crate::path::PathSet;
use crate::stats::LayerStats;

/// How much of a layer was successfully walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    /// Every subtree was read.
    Complete,
    /// Some subtrees failed or the walk was cut short.
    Partial,
    /// The root itself could not be walked.
    Unusable,
}

/// The result of walking one layer: statistics, paths and warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerTree {
    /// The layer that was walked.
    pub layer: Layer,

    /// Walk outcome.
    pub status: LayerStatus,

    /// Summary statistics.
    pub stats: LayerStats,

    /// Relative file and directory paths.
    pub paths: PathSet,

    /// Duration of the walk.
    pub walk_duration: Duration,

    /// Warnings encountered during the walk.
    pub warnings: Vec<LayerWarning>,
}

impl LayerTree {
    /// Create a new layer tree.
    pub fn new(
        layer: Layer,
        status: LayerStatus,
        stats: LayerStats,
        paths: PathSet,
        walk_duration: Duration,
        warnings: Vec<LayerWarning>,
    ) -> Self {
        Self {
            layer,
            status,
            stats,
            paths,
            walk_duration,
            warnings,
        }
    }

    /// Tree for a layer whose root could not be walked at all.
    pub fn unusable(layer: Layer, warning: LayerWarning) -> Self {
        Self {
            layer,
            status: LayerStatus::Unusable,
            stats: LayerStats::default(),
            paths: PathSet::default(),
            walk_duration: Duration::ZERO,
            warnings: vec![warning],
        }
    }

    /// Check if there were any warnings during the walk.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the walk produced any data.
    pub fn is_usable(&self) -> bool {
        self.status != LayerStatus::Unusable
    }
}
