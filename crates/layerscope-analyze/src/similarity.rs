//! Cross-layer path similarity.
//!
//! Two independent passes over the target layer's paths:
//! 1. Existence: scan lower layers in order and stop at the first one that
//!    has the path. Drives the match count, matched depth and first-match
//!    distribution.
//! 2. Spread: for every matched path, count all lower layers that have it.
//!
//! Lookups are hash-set membership tests, so the cost is
//! O(paths x lower layers) lookups.

use layerscope_core::{
    AnalysisError, LayerMatchCount, Metric, PathKind, PathSet, RelativePath, SimilarityResult,
};
use layerscope_scan::LayerInventory;

/// Compares one layer's paths against lower layers.
pub struct SimilarityEngine;

impl SimilarityEngine {
    /// Compare `target`'s paths of `kind` against `lowers`, scanned in the given order.
    ///
    /// `lowers` pairs each lower layer's index with its path set.
    pub fn compare(kind: PathKind, target: &PathSet, lowers: &[(usize, &PathSet)]) -> SimilarityResult {
        let candidates = target.paths(kind);
        let candidate_count = candidates.len() as u64;

        if lowers.is_empty() {
            return SimilarityResult::unmatched(kind, candidate_count);
        }

        let mut first_matches: Vec<LayerMatchCount> = lowers
            .iter()
            .map(|(layer, _)| LayerMatchCount {
                layer: *layer,
                count: 0,
            })
            .collect();

        // Pass 1: existence, first lower layer wins
        let mut matched: Vec<&RelativePath> = Vec::new();
        let mut depth_total: u64 = 0;
        for path in candidates {
            let first = lowers
                .iter()
                .position(|(_, lower)| lower.contains(kind, path.as_str()));
            if let Some(slot) = first {
                first_matches[slot].count += 1;
                depth_total += path.depth() as u64;
                matched.push(path);
            }
        }

        // Pass 2: spread, every lower layer counts
        let spread_total: u64 = matched
            .iter()
            .map(|path| {
                lowers
                    .iter()
                    .filter(|(_, lower)| lower.contains(kind, path.as_str()))
                    .count() as u64
            })
            .sum();

        let matches = matched.len() as u64;
        SimilarityResult {
            kind,
            candidates: candidate_count,
            matches,
            avg_match_depth: Metric::ratio(depth_total, matches),
            avg_layers_matched: Metric::ratio(spread_total, matches),
            match_percent: Metric::percent(matches, candidate_count),
            first_matches,
        }
    }
}

/// Similarity of layer `layer_index` against the listed lower layers of `inventory`.
///
/// Every index in `lower_indices` must name a layer strictly below
/// `layer_index`; they are scanned in the order given.
pub fn similarity(
    kind: PathKind,
    layer_index: usize,
    inventory: &LayerInventory,
    lower_indices: &[usize],
) -> Result<SimilarityResult, AnalysisError> {
    let target = inventory.paths(layer_index)?;

    let lowers = lower_indices
        .iter()
        .map(|&lower| {
            if lower <= layer_index {
                return Err(AnalysisError::NotALowerLayer {
                    layer: layer_index,
                    lower,
                });
            }
            inventory.paths(lower).map(|paths| (lower, paths))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let result = SimilarityEngine::compare(kind, target, &lowers);
    tracing::debug!(
        layer = layer_index,
        kind = %kind,
        candidates = result.candidates,
        matches = result.matches,
        "Computed similarity"
    );
    Ok(result)
}
