//! Layer walking and path inventory for layerscope.
//!
//! This crate walks each layer of a union-mount stack and builds the
//! per-layer path sets that the similarity engine compares.
//!
//! # Overview
//!
//! - **Parallel traversal** of real directories via jwalk/rayon
//! - **In-memory fixtures** that walk synthetic trees without a mount
//! - **Partial results**: unreadable subtrees become warnings, not errors
//! - **Cancellation** through a token and an optional deadline
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use layerscope_scan::{InventoryBuilder, JwalkWalker, LayerStack, WalkBudget};
//!
//! let stack = LayerStack::new(["/var/lib/overlay/upper", "/var/lib/overlay/l1"]);
//! let walker = JwalkWalker::new();
//! let inventory = InventoryBuilder::new(&walker).build(&stack, &WalkBudget::unlimited());
//!
//! for tree in inventory.iter() {
//!     println!("{}: {} files", tree.layer.root.display(), tree.stats.file_count);
//! }
//! ```
//!
//! # Fixtures
//!
//! ```rust
//! use layerscope_scan::{Layer, MemoryTree, MemoryWalker, TreeWalker, WalkBudget};
//!
//! let walker = MemoryWalker::new()
//!     .with_tree("/upper", MemoryTree::new().file("/etc/hosts"));
//! let tree = walker.walk(&Layer::new(0, "/upper"), &WalkBudget::unlimited());
//! assert_eq!(tree.stats.file_count, 1);
//! assert_eq!(tree.stats.dir_count, 2);
//! ```

mod accumulator;
mod budget;
mod depth;
mod filter;
mod inventory;
mod memory;
mod progress;
mod scanner;
mod walker;

pub use accumulator::{EntryKind, TreeAccumulator};
pub use budget::WalkBudget;
pub use depth::DepthAccumulator;
pub use filter::EntryFilter;
pub use inventory::{InventoryBuilder, LayerInventory};
pub use memory::{MemoryTree, MemoryWalker};
pub use progress::WalkProgress;
pub use scanner::JwalkWalker;
pub use walker::TreeWalker;

// Re-export core types for convenience
pub use layerscope_core::{
    AnalysisError, AnalyzeConfig, Layer, LayerStack, LayerStats, LayerStatus, LayerTree,
    LayerWarning, PathKind, PathSet, RelativePath, TraversalError, WarningKind,
};
