//! Whole-stack analysis.

use std::time::Instant;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use layerscope_core::{
    AnalysisError, AnalyzeConfig, LayerReport, LayerStack, LayerTree, LayerWarning, PathKind,
    StackReport,
};
use layerscope_scan::{InventoryBuilder, JwalkWalker, LayerInventory, TreeWalker, WalkBudget};

use crate::similarity::SimilarityEngine;

/// Analyzes a layer stack: walks every layer, then compares each layer's
/// paths against all layers below it.
pub struct StackAnalyzer<W: TreeWalker = JwalkWalker> {
    config: AnalyzeConfig,
    walker: W,
}

impl StackAnalyzer<JwalkWalker> {
    /// Create an analyzer with default settings.
    pub fn new() -> Self {
        Self {
            config: AnalyzeConfig::default(),
            walker: JwalkWalker::new(),
        }
    }

    /// Create an analyzer with custom configuration.
    pub fn with_config(config: AnalyzeConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let walker = JwalkWalker::with_config(&config)?;
        Ok(Self { config, walker })
    }
}

impl Default for StackAnalyzer<JwalkWalker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: TreeWalker> StackAnalyzer<W> {
    /// Create an analyzer that walks layers with `walker`.
    pub fn with_walker(config: AnalyzeConfig, walker: W) -> Self {
        Self { config, walker }
    }

    /// Configuration in use.
    pub fn config(&self) -> &AnalyzeConfig {
        &self.config
    }

    /// The layer walker.
    pub fn walker(&self) -> &W {
        &self.walker
    }

    /// Analyze `stack`, honoring the configured timeout.
    pub fn analyze(&self, stack: &LayerStack) -> StackReport {
        let budget = WalkBudget::new(CancellationToken::new(), self.config.timeout);
        self.analyze_with_budget(stack, &budget)
    }

    /// Analyze `stack` under an external cancellation budget.
    ///
    /// Never fails as a whole: per-layer problems are recorded in the
    /// affected layer's record and the rest of the stack is still analyzed.
    pub fn analyze_with_budget(&self, stack: &LayerStack, budget: &WalkBudget) -> StackReport {
        let start = Instant::now();

        if stack.is_empty() {
            tracing::warn!("Layer stack is empty, nothing to analyze");
            return StackReport::new(
                Vec::new(),
                vec![LayerWarning::empty_stack()],
                start.elapsed(),
                self.config.clone(),
            );
        }

        tracing::info!(
            layers = stack.len(),
            parallel = self.config.parallel_layers,
            "Analyzing layer stack"
        );

        let inventory = InventoryBuilder::new(&self.walker)
            .parallel(self.config.parallel_layers)
            .build(stack, budget);

        let trees: Vec<&LayerTree> = inventory.iter().collect();
        let layers: Vec<LayerReport> = if self.config.parallel_layers {
            trees
                .par_iter()
                .map(|tree| layer_report(tree, stack, &inventory))
                .collect()
        } else {
            trees
                .iter()
                .map(|tree| layer_report(tree, stack, &inventory))
                .collect()
        };

        for layer in &layers {
            for warning in &layer.warnings {
                tracing::warn!(
                    layer = layer.layer.index,
                    top = layer.layer.is_top(),
                    kind = ?warning.kind,
                    path = %warning.path.display(),
                    "{}",
                    warning.message
                );
            }
        }

        let report = StackReport::new(layers, Vec::new(), start.elapsed(), self.config.clone());

        if !report.primary_usable() {
            tracing::warn!("Topmost layer could not be walked; its record holds no data");
        }

        tracing::info!(
            layers = report.layers.len(),
            warnings = report.warning_count(),
            elapsed_ms = report.duration.as_millis() as u64,
            "Layer stack analysis complete"
        );

        report
    }
}

/// Build the record of one walked layer.
fn layer_report(tree: &LayerTree, stack: &LayerStack, inventory: &LayerInventory) -> LayerReport {
    let lowers = inventory.lower_path_sets(stack.lower_indices(tree.layer.index));

    LayerReport {
        layer: tree.layer.clone(),
        status: tree.status,
        stats: tree.stats.clone(),
        files: SimilarityEngine::compare(PathKind::File, &tree.paths, &lowers),
        directories: SimilarityEngine::compare(PathKind::Directory, &tree.paths, &lowers),
        warnings: tree.warnings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerscope_core::{LayerStatus, Metric, WarningKind};
    use layerscope_scan::{MemoryTree, MemoryWalker};

    fn analyzer(walker: MemoryWalker) -> StackAnalyzer<MemoryWalker> {
        StackAnalyzer::with_walker(AnalyzeConfig::default(), walker)
    }

    #[test]
    fn test_empty_stack() {
        let report = analyzer(MemoryWalker::new()).analyze(&LayerStack::new(Vec::<&str>::new()));

        assert!(report.layers.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::EmptyStack);
    }

    #[test]
    fn test_bottom_layer_has_nothing_to_match() {
        let walker = MemoryWalker::new()
            .with_tree("/upper", MemoryTree::new().file("/etc/hosts"))
            .with_tree("/base", MemoryTree::new().file("/etc/hosts"));
        let report = analyzer(walker).analyze(&LayerStack::new(["/upper", "/base"]));

        let base = &report.layers[1];
        assert_eq!(base.files.matches, 0);
        assert!(base.files.avg_match_depth.is_undefined());
        assert!(base.files.first_matches.is_empty());

        let upper = &report.layers[0];
        assert_eq!(upper.files.matches, 1);
        assert_eq!(upper.files.match_percent, Metric::Value(100.0));
        // "/" and "/etc"
        assert_eq!(upper.directories.matches, 2);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let walker = MemoryWalker::new()
            .with_tree("/a", MemoryTree::new().file("/x/1").file("/y/2"))
            .with_tree("/b", MemoryTree::new().file("/x/1"))
            .with_tree("/c", MemoryTree::new().file("/y/2").file("/x/1"));
        let stack = LayerStack::new(["/a", "/b", "/c"]);

        let parallel = analyzer(walker.clone()).analyze(&stack);
        let config = AnalyzeConfig::builder().parallel_layers(false).build().unwrap();
        let sequential = StackAnalyzer::with_walker(config, walker).analyze(&stack);

        for (p, s) in parallel.layers.iter().zip(&sequential.layers) {
            assert_eq!(p.layer, s.layer);
            assert_eq!(p.files, s.files);
            assert_eq!(p.directories, s.directories);
        }
    }

    #[test]
    fn test_unusable_primary() {
        let walker = MemoryWalker::new().with_tree("/base", MemoryTree::new().file("/f"));
        let report = analyzer(walker).analyze(&LayerStack::new(["/gone", "/base"]));

        assert!(!report.primary_usable());
        assert_eq!(report.layers[0].status, LayerStatus::Unusable);
        assert_eq!(report.layers[0].files.candidates, 0);
        assert_eq!(report.layers[1].stats.file_count, 1);
    }
}
