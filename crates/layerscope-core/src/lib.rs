//! Core types for layerscope.
//!
//! This crate provides the data model shared by the scanning and analysis
//! crates: layer stacks, layer-relative paths and path sets, per-layer
//! statistics, similarity results, reports, configuration and errors.

mod config;
mod error;
mod layer;
mod metric;
mod path;
mod report;
mod stats;
mod tree;

pub use config::{AnalyzeConfig, AnalyzeConfigBuilder, AnalyzeConfigBuilderError};
pub use error::{AnalysisError, LayerWarning, TraversalError, WarningKind};
pub use layer::{Layer, LayerStack};
pub use metric::Metric;
pub use path::{PathKind, PathSet, PathSetBuilder, RelativePath};
pub use report::{LayerMatchCount, LayerReport, SimilarityResult, StackReport};
pub use stats::LayerStats;
pub use tree::{LayerStatus, LayerTree};
