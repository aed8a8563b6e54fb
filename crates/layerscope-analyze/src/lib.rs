//! Cross-layer analysis for layerscope.
//!
//! This crate compares the paths of each layer in a union-mount stack
//! against every layer below it:
//!
//! - **Similarity** - how many paths of a layer also exist lower down,
//!   at what depth, and across how many lower layers
//! - **Stack reports** - structural statistics plus file and directory
//!   similarity for every layer, topmost first
//!
//! # Similarity
//!
//! A path matches when the identical relative path exists in at least one
//! strictly lower layer. Each matched path counts once toward the match
//! count and average depth, at the first lower layer that has it. The
//! spread metric separately counts every lower layer that has it.
//!
//! ```rust
//! use layerscope_analyze::SimilarityEngine;
//! use layerscope_core::{PathKind, PathSet};
//!
//! let upper = PathSet::from_paths([], ["/a", "/a/b", "/a/c"]);
//! let lower = PathSet::from_paths([], ["/a", "/a/b"]);
//!
//! let result = SimilarityEngine::compare(PathKind::Directory, &upper, &[(1, &lower)]);
//! assert_eq!(result.matches, 2);
//! assert_eq!(result.avg_match_depth.value(), Some(1.5));
//! assert_eq!(result.avg_layers_matched.value(), Some(1.0));
//! ```
//!
//! # Stack Analysis
//!
//! ```rust,no_run
//! use layerscope_analyze::StackAnalyzer;
//! use layerscope_core::LayerStack;
//!
//! let stack = LayerStack::new(["/var/lib/overlay/upper", "/var/lib/overlay/l1"]);
//! let report = StackAnalyzer::new().analyze(&stack);
//!
//! for layer in &report.layers {
//!     println!(
//!         "{}: {} of {} directories shadow a lower layer",
//!         layer.layer.root.display(),
//!         layer.directories.matches,
//!         layer.directories.candidates,
//!     );
//! }
//! ```

mod aggregate;
mod similarity;

pub use aggregate::StackAnalyzer;
pub use similarity::{SimilarityEngine, similarity};

// Re-export core types
pub use layerscope_core::{
    LayerReport, LayerStack, Metric, PathKind, SimilarityResult, StackReport,
};
