//! Similarity results and analysis reports.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AnalyzeConfig;
use crate::error::LayerWarning;
use crate::layer::Layer;
use crate::metric::Metric;
use crate::path::PathKind;
use crate::stats::LayerStats;
use crate::tree::LayerStatus;

/// Number of target paths whose first match was found in one lower layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMatchCount {
    /// Index of the lower layer.
    pub layer: usize,
    /// Paths that first matched in this layer.
    pub count: u64,
}

/// Cross-layer similarity of one layer's paths of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Path kind compared.
    pub kind: PathKind,
    /// Paths of this kind in the target layer.
    pub candidates: u64,
    /// Paths also present in at least one lower layer, each counted once.
    pub matches: u64,
    /// Mean component count of matched paths.
    pub avg_match_depth: Metric,
    /// Mean number of lower layers each matched path appears in.
    pub avg_layers_matched: Metric,
    /// Share of candidates that matched, in percent.
    pub match_percent: Metric,
    /// Where each match was first found, one entry per lower layer scanned.
    pub first_matches: Vec<LayerMatchCount>,
}

impl SimilarityResult {
    /// Result for a layer with no lower layers to compare against.
    pub fn unmatched(kind: PathKind, candidates: u64) -> Self {
        Self {
            kind,
            candidates,
            matches: 0,
            avg_match_depth: Metric::Undefined,
            avg_layers_matched: Metric::Undefined,
            match_percent: Metric::percent(0, candidates),
            first_matches: Vec::new(),
        }
    }

    /// Check if any path matched.
    pub fn has_matches(&self) -> bool {
        self.matches > 0
    }
}

/// One layer's record in a [`StackReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerReport {
    /// The layer described.
    pub layer: Layer,
    /// Walk outcome.
    pub status: LayerStatus,
    /// Structural statistics.
    pub stats: LayerStats,
    /// Similarity of file paths against all lower layers.
    pub files: SimilarityResult,
    /// Similarity of directory paths against all lower layers.
    pub directories: SimilarityResult,
    /// Warnings for this layer.
    pub warnings: Vec<LayerWarning>,
}

impl LayerReport {
    /// Similarity result for `kind`.
    pub fn similarity(&self, kind: PathKind) -> &SimilarityResult {
        match kind {
            PathKind::File => &self.files,
            PathKind::Directory => &self.directories,
        }
    }

    /// Check if there were any warnings for this layer.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Complete analysis of a layer stack, topmost layer first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackReport {
    /// One record per layer, in input order.
    pub layers: Vec<LayerReport>,

    /// Warnings about the stack as a whole.
    pub warnings: Vec<LayerWarning>,

    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,

    /// Duration of the analysis.
    pub duration: Duration,

    /// Configuration used.
    pub config: AnalyzeConfig,
}

impl StackReport {
    /// Create a new report.
    pub fn new(
        layers: Vec<LayerReport>,
        warnings: Vec<LayerWarning>,
        duration: Duration,
        config: AnalyzeConfig,
    ) -> Self {
        Self {
            layers,
            warnings,
            analyzed_at: Utc::now(),
            duration,
            config,
        }
    }

    /// The topmost layer's record.
    pub fn primary(&self) -> Option<&LayerReport> {
        self.layers.first()
    }

    /// Whether the topmost layer produced data.
    pub fn primary_usable(&self) -> bool {
        self.primary()
            .is_some_and(|layer| layer.status != LayerStatus::Unusable)
    }

    /// Number of warnings across the stack and all layers.
    pub fn warning_count(&self) -> usize {
        self.warnings.len() + self.layers.iter().map(|l| l.warnings.len()).sum::<usize>()
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }
}
