//! Folds walked entries into a [`LayerTree`].

use std::time::Instant;

use layerscope_core::{
    Layer, LayerStats, LayerStatus, LayerTree, LayerWarning, PathKind, PathSetBuilder,
    RelativePath, TraversalError,
};

use crate::depth::DepthAccumulator;

/// Kind of a walked entry. Symlinks are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link, whatever its target.
    Symlink,
    /// Sockets, devices, fifos.
    Other,
}

impl EntryKind {
    /// Classify a file type obtained without following symlinks.
    pub fn from_file_type(file_type: &std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    /// Path set this entry belongs to.
    pub fn path_kind(self) -> PathKind {
        match self {
            Self::Directory => PathKind::Directory,
            Self::File | Self::Symlink | Self::Other => PathKind::File,
        }
    }
}

/// Collects statistics, paths and warnings for one layer walk.
#[derive(Debug)]
pub struct TreeAccumulator {
    layer: Layer,
    stats: LayerStats,
    depths: DepthAccumulator,
    paths: PathSetBuilder,
    warnings: Vec<LayerWarning>,
    started: Instant,
}

impl TreeAccumulator {
    /// Start accumulating for `layer`.
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            stats: LayerStats::new(),
            depths: DepthAccumulator::new(),
            paths: PathSetBuilder::default(),
            warnings: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Record one entry at `depth` below the layer root.
    pub fn record(&mut self, path: RelativePath, kind: EntryKind, depth: u32) {
        match kind {
            EntryKind::Directory => self.stats.record_dir(depth),
            EntryKind::Symlink => {
                self.stats.record_symlink(depth);
                self.depths.record(depth);
            }
            EntryKind::File | EntryKind::Other => {
                self.stats.record_file(depth);
                self.depths.record(depth);
            }
        }
        self.paths.insert(kind.path_kind(), path);
    }

    /// Record a subtree that could not be walked.
    pub fn record_error(&mut self, error: TraversalError) {
        tracing::debug!(layer = self.layer.index, error = %error, "Traversal error");
        self.warnings.push(LayerWarning::from(error));
    }

    /// Statistics so far.
    pub fn stats(&self) -> &LayerStats {
        &self.stats
    }

    /// Number of warnings so far.
    pub fn error_count(&self) -> usize {
        self.warnings.len()
    }

    /// Finish the walk.
    pub fn finish(mut self) -> LayerTree {
        self.stats.avg_file_depth = self.depths.average();

        if self.stats.file_count == 0 {
            self.warnings
                .push(LayerWarning::empty(&self.layer.root, PathKind::File));
        }
        if self.stats.dir_count == 0 {
            self.warnings
                .push(LayerWarning::empty(&self.layer.root, PathKind::Directory));
        }

        let status = if self.warnings.iter().any(|w| w.kind.is_traversal()) {
            LayerStatus::Partial
        } else {
            LayerStatus::Complete
        };

        LayerTree::new(
            self.layer,
            status,
            self.stats,
            self.paths.build(),
            self.started.elapsed(),
            self.warnings,
        )
    }
}
