//! Structural statistics for one layer.

use serde::{Deserialize, Serialize};

use crate::metric::Metric;

/// Summary statistics for a walked layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerStats {
    /// Number of non-directory entries (symlinks included).
    pub file_count: u64,
    /// Number of directories, the layer root included.
    pub dir_count: u64,
    /// Number of symbolic links (a subset of `file_count`).
    pub symlink_count: u64,
    /// Maximum depth reached; the root is depth 0.
    pub max_depth: u32,
    /// Mean depth of non-directory entries, undefined without files.
    pub avg_file_depth: Metric,
}

impl LayerStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-directory entry.
    pub fn record_file(&mut self, depth: u32) {
        self.file_count += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a symlink. Symlinks are also files.
    pub fn record_symlink(&mut self, depth: u32) {
        self.symlink_count += 1;
        self.record_file(depth);
    }

    /// Record a directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.dir_count += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Total entries walked.
    pub fn total_entries(&self) -> u64 {
        self.file_count + self.dir_count
    }
}
