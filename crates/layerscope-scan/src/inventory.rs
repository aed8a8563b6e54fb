//! Per-layer path inventory for a whole stack.

use std::time::Instant;

use dashmap::DashMap;
use indexmap::IndexMap;
use rayon::prelude::*;

use layerscope_core::{AnalysisError, Layer, LayerStack, LayerTree, PathSet};

use crate::budget::WalkBudget;
use crate::walker::TreeWalker;

/// Walks every layer of a stack once and collects the results.
///
/// Layer walks are independent and run concurrently on the rayon pool
/// unless parallelism is turned off. `build` returns only after every
/// walk has finished.
pub struct InventoryBuilder<'w, W: TreeWalker + ?Sized> {
    walker: &'w W,
    parallel: bool,
}

impl<'w, W: TreeWalker + ?Sized> InventoryBuilder<'w, W> {
    /// Create a builder that walks layers with `walker`.
    pub fn new(walker: &'w W) -> Self {
        Self {
            walker,
            parallel: true,
        }
    }

    /// Walk layers concurrently (default) or one after another.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Walk every layer of `stack`.
    pub fn build(&self, stack: &LayerStack, budget: &WalkBudget) -> LayerInventory {
        let start = Instant::now();
        let walked: DashMap<usize, LayerTree> = DashMap::with_capacity(stack.len());

        let walk_one = |layer: &Layer| {
            let tree = self.walker.walk(layer, budget);
            walked.insert(layer.index, tree);
        };

        if self.parallel {
            stack.as_slice().par_iter().for_each(walk_one);
        } else {
            stack.iter().for_each(walk_one);
        }

        // Freeze in stack order
        let mut trees = IndexMap::with_capacity(stack.len());
        for layer in stack {
            if let Some((index, tree)) = walked.remove(&layer.index) {
                trees.insert(index, tree);
            }
        }

        tracing::debug!(
            layers = trees.len(),
            paths = trees.values().map(|t| t.paths.total_len()).sum::<usize>(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built path inventory"
        );

        LayerInventory { trees }
    }
}

/// Walked layers keyed by layer index, in stack order. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct LayerInventory {
    trees: IndexMap<usize, LayerTree>,
}

impl LayerInventory {
    /// Number of layers.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Check if the inventory has no layers.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// The walked tree of layer `index`.
    pub fn get(&self, index: usize) -> Option<&LayerTree> {
        self.trees.get(&index)
    }

    /// Path set of layer `index`.
    pub fn paths(&self, index: usize) -> Result<&PathSet, AnalysisError> {
        self.get(index)
            .map(|tree| &tree.paths)
            .ok_or(AnalysisError::UnknownLayer {
                index,
                len: self.len(),
            })
    }

    /// Path sets of the layers named by `indices`, skipping unknown ones.
    pub fn lower_path_sets(
        &self,
        indices: impl IntoIterator<Item = usize>,
    ) -> Vec<(usize, &PathSet)> {
        indices
            .into_iter()
            .filter_map(|lower| self.trees.get(&lower).map(|tree| (lower, &tree.paths)))
            .collect()
    }

    /// Iterate walked layers in stack order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerTree> {
        self.trees.values()
    }
}
