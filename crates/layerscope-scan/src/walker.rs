//! The tree-walking seam.

use layerscope_core::{Layer, LayerTree};

use crate::budget::WalkBudget;

/// Walks one layer into a [`LayerTree`].
///
/// Implementations never fail as a whole: a missing root yields an
/// unusable tree, unreadable subtrees yield warnings, and an exhausted
/// budget yields whatever was collected before it ran out.
///
/// Symlinks are never followed. A symlink is a single non-directory
/// entry whatever its target is.
pub trait TreeWalker: Send + Sync {
    /// Walk `layer` within `budget`.
    fn walk(&self, layer: &Layer, budget: &WalkBudget) -> LayerTree;
}

impl<W: TreeWalker + ?Sized> TreeWalker for &W {
    fn walk(&self, layer: &Layer, budget: &WalkBudget) -> LayerTree {
        (**self).walk(layer, budget)
    }
}
