//! JWalk-based parallel layer walker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;

use layerscope_core::{
    AnalysisError, AnalyzeConfig, Layer, LayerTree, LayerWarning, RelativePath, TraversalError,
};

use crate::accumulator::{EntryKind, TreeAccumulator};
use crate::budget::WalkBudget;
use crate::filter::EntryFilter;
use crate::progress::WalkProgress;
use crate::walker::TreeWalker;

/// Entries between two progress updates.
const PROGRESS_INTERVAL: u64 = 1000;

/// Walks real directories using jwalk.
pub struct JwalkWalker {
    filter: Arc<EntryFilter>,
    walk_threads: usize,
    progress_tx: broadcast::Sender<WalkProgress>,
}

impl JwalkWalker {
    /// Create a walker that keeps every entry and walks serially.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            filter: Arc::new(EntryFilter::allow_all()),
            walk_threads: 0,
            progress_tx,
        }
    }

    /// Create a walker from an analysis config.
    pub fn with_config(config: &AnalyzeConfig) -> Result<Self, AnalysisError> {
        let (progress_tx, _) = broadcast::channel(100);
        Ok(Self {
            filter: Arc::new(EntryFilter::from_config(config)?),
            walk_threads: config.walk_threads,
            progress_tx,
        })
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    fn parallelism(&self) -> Parallelism {
        match self.walk_threads {
            0 | 1 => Parallelism::Serial,
            n => Parallelism::RayonNewPool(n),
        }
    }

    /// Resolve the layer root, or explain why it cannot be walked.
    fn open_root(layer: &Layer) -> Result<(PathBuf, bool), AnalysisError> {
        let root = layer
            .root
            .canonicalize()
            .map_err(|e| AnalysisError::root(&layer.root, &e))?;
        let metadata = std::fs::metadata(&root).map_err(|e| AnalysisError::root(&root, &e))?;
        Ok((root, metadata.is_dir()))
    }

    fn send_progress(&self, layer: &Layer, acc: &TreeAccumulator, path: &Path, started: Instant, finished: bool) {
        let stats = acc.stats();
        let _ = self.progress_tx.send(WalkProgress {
            layer: layer.index,
            files_walked: stats.file_count,
            dirs_walked: stats.dir_count,
            current_path: path.to_path_buf(),
            errors_count: acc.error_count() as u64,
            elapsed: started.elapsed(),
            finished,
        });
    }
}

impl TreeWalker for JwalkWalker {
    fn walk(&self, layer: &Layer, budget: &WalkBudget) -> LayerTree {
        let started = Instant::now();

        let (root, is_dir) = match Self::open_root(layer) {
            Ok(root) => root,
            Err(err) => {
                tracing::warn!(layer = layer.index, root = %layer.root.display(), error = %err, "Layer root unusable");
                return LayerTree::unusable(layer.clone(), LayerWarning::malformed(&layer.root, &err));
            }
        };

        let mut acc = TreeAccumulator::new(layer.clone());

        // A non-directory root has no children and depth 0
        if !is_dir {
            tracing::debug!(layer = layer.index, root = %root.display(), "Layer root is not a directory");
            return acc.finish();
        }

        let filter = Arc::clone(&self.filter);
        let dir_budget = budget.clone();
        let pruned = Arc::new(AtomicBool::new(false));
        let dir_pruned = Arc::clone(&pruned);
        let walker = WalkDir::new(&root)
            .parallelism(self.parallelism())
            .skip_hidden(!filter.include_hidden())
            .follow_links(false)
            .min_depth(0)
            .process_read_dir(move |_depth, _path, _state, children| {
                if dir_budget.is_exhausted() {
                    if !children.is_empty() {
                        dir_pruned.store(true, Ordering::Relaxed);
                    }
                    children.clear();
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) => !filter.matches_exclusion(&entry.file_name),
                    Err(_) => true,
                });
            });

        let mut seen: u64 = 0;
        let mut cancelled = false;
        for entry_result in walker {
            if budget.is_exhausted() {
                cancelled = true;
                break;
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    acc.record_error(traversal_error(&err, &root));
                    continue;
                }
            };

            let path = entry.path();
            let Some(relative) = RelativePath::strip(&root, &path) else {
                continue;
            };
            let kind = EntryKind::from_file_type(&entry.file_type());
            acc.record(relative, kind, entry.depth() as u32);

            // The directory itself is counted; its unreadable contents are not
            if let Some(err) = &entry.read_children_error {
                acc.record_error(traversal_error(err, &path));
            }

            seen += 1;
            if seen % PROGRESS_INTERVAL == 0 {
                self.send_progress(layer, &acc, &path, started, false);
            }
        }

        if cancelled || pruned.load(Ordering::Relaxed) {
            acc.record_error(TraversalError::Cancelled { path: root.clone() });
        }

        self.send_progress(layer, &acc, &root, started, true);
        let tree = acc.finish();
        tracing::debug!(
            layer = layer.index,
            files = tree.stats.file_count,
            dirs = tree.stats.dir_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Walked layer"
        );
        tree
    }
}

impl Default for JwalkWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a jwalk error into a per-subtree traversal error, falling back to `at` for the path.
fn traversal_error(err: &jwalk::Error, at: &Path) -> TraversalError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| at.to_path_buf());
    match err.io_error() {
        Some(io) => TraversalError::io(path, io),
        None => TraversalError::Io {
            path,
            message: err.to_string(),
        },
    }
}
