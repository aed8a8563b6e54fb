//! In-memory layer trees for tests and synthetic stacks.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use layerscope_core::{AnalysisError, Layer, LayerTree, LayerWarning, RelativePath, TraversalError};

use crate::accumulator::{EntryKind, TreeAccumulator};
use crate::budget::WalkBudget;
use crate::filter::EntryFilter;
use crate::walker::TreeWalker;

#[derive(Debug, Clone)]
enum MemoryNode {
    File,
    Symlink,
    Dir {
        children: BTreeMap<String, MemoryNode>,
        readable: bool,
    },
}

impl MemoryNode {
    fn empty_dir() -> Self {
        Self::Dir {
            children: BTreeMap::new(),
            readable: true,
        }
    }
}

/// A synthetic directory tree.
///
/// Paths are `/`-separated and relative to the tree root; missing parent
/// directories are created on insert.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    root: MemoryNode,
}

impl MemoryTree {
    /// An empty tree whose root is a directory.
    pub fn new() -> Self {
        Self {
            root: MemoryNode::empty_dir(),
        }
    }

    /// A tree whose root is a regular file.
    pub fn file_root() -> Self {
        Self {
            root: MemoryNode::File,
        }
    }

    /// Add a directory.
    pub fn dir(mut self, path: &str) -> Self {
        self.node_mut(path);
        self
    }

    /// Add a regular file.
    pub fn file(mut self, path: &str) -> Self {
        *self.node_mut(path) = MemoryNode::File;
        self
    }

    /// Add a symbolic link.
    pub fn symlink(mut self, path: &str) -> Self {
        *self.node_mut(path) = MemoryNode::Symlink;
        self
    }

    /// Mark a directory as unreadable; it is created if missing.
    pub fn unreadable(mut self, path: &str) -> Self {
        if let MemoryNode::Dir { readable, .. } = self.node_mut(path) {
            *readable = false;
        }
        self
    }

    /// Walk to `path`, creating directories along the way.
    fn node_mut(&mut self, path: &str) -> &mut MemoryNode {
        let mut node = &mut self.root;
        for name in path.split('/').filter(|c| !c.is_empty()) {
            if !matches!(node, MemoryNode::Dir { .. }) {
                *node = MemoryNode::empty_dir();
            }
            let MemoryNode::Dir { children, .. } = node else {
                unreachable!("node was just made a directory");
            };
            node = children
                .entry(name.to_string())
                .or_insert_with(MemoryNode::empty_dir);
        }
        node
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks [`MemoryTree`]s registered under layer root paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryWalker {
    trees: HashMap<PathBuf, MemoryTree>,
    filter: EntryFilter,
}

impl MemoryWalker {
    /// A walker with no trees.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tree` as the content of the layer rooted at `root`.
    pub fn with_tree(mut self, root: impl Into<PathBuf>, tree: MemoryTree) -> Self {
        self.trees.insert(root.into(), tree);
        self
    }

    /// Apply an entry filter to every walk.
    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl TreeWalker for MemoryWalker {
    fn walk(&self, layer: &Layer, budget: &WalkBudget) -> LayerTree {
        let Some(tree) = self.trees.get(&layer.root) else {
            let err = AnalysisError::MissingRoot {
                path: layer.root.clone(),
            };
            return LayerTree::unusable(layer.clone(), LayerWarning::malformed(&layer.root, &err));
        };

        let started = Instant::now();
        let mut acc = TreeAccumulator::new(layer.clone());

        if !matches!(tree.root, MemoryNode::Dir { .. }) {
            return acc.finish();
        }

        // Explicit work stack; children are pushed in reverse so they pop in name order
        let mut stack: Vec<(RelativePath, &MemoryNode, u32)> =
            vec![(RelativePath::root(), &tree.root, 0)];

        while let Some((path, node, depth)) = stack.pop() {
            if budget.is_exhausted() {
                acc.record_error(TraversalError::Cancelled {
                    path: absolute(&layer.root, &path),
                });
                break;
            }

            match node {
                MemoryNode::File => acc.record(path, EntryKind::File, depth),
                MemoryNode::Symlink => acc.record(path, EntryKind::Symlink, depth),
                MemoryNode::Dir { children, readable } => {
                    acc.record(path.clone(), EntryKind::Directory, depth);
                    if !*readable {
                        acc.record_error(TraversalError::PermissionDenied {
                            path: absolute(&layer.root, &path),
                        });
                        continue;
                    }
                    for (name, child) in children.iter().rev() {
                        if self.filter.is_excluded(name) {
                            continue;
                        }
                        stack.push((path.join(name), child, depth + 1));
                    }
                }
            }
        }

        let tree = acc.finish();
        tracing::debug!(
            layer = layer.index,
            files = tree.stats.file_count,
            dirs = tree.stats.dir_count,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Walked in-memory layer"
        );
        tree
    }
}

/// Rebuild the on-layer path of a relative path.
fn absolute(root: &Path, path: &RelativePath) -> PathBuf {
    path.components().fold(root.to_path_buf(), |acc, c| acc.join(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerscope_core::{LayerStatus, Metric, PathKind, WarningKind};

    fn walk(tree: MemoryTree) -> LayerTree {
        let walker = MemoryWalker::new().with_tree("/layer", tree);
        walker.walk(&Layer::new(0, "/layer"), &WalkBudget::unlimited())
    }

    #[test]
    fn test_empty_tree_counts_root() {
        let tree = walk(MemoryTree::new());
        assert_eq!(tree.stats.dir_count, 1);
        assert_eq!(tree.stats.max_depth, 0);
        assert!(tree.stats.avg_file_depth.is_undefined());
        assert!(tree.paths.contains(PathKind::Directory, "/"));
        assert!(tree.warnings.iter().any(|w| w.kind == WarningKind::EmptyFiles));
    }

    #[test]
    fn test_nested_tree() {
        let tree = walk(
            MemoryTree::new()
                .file("/a/b/c/deep.txt")
                .file("/top.txt")
                .symlink("/a/link")
                .dir("/empty"),
        );

        assert_eq!(tree.stats.dir_count, 5);
        assert_eq!(tree.stats.file_count, 3);
        assert_eq!(tree.stats.symlink_count, 1);
        assert_eq!(tree.stats.max_depth, 4);
        // (4 + 1 + 2) / 3
        assert_eq!(tree.stats.avg_file_depth, Metric::Value(7.0 / 3.0));
        assert!(tree.paths.contains(PathKind::Directory, "/a/b/c"));
        assert!(tree.paths.contains(PathKind::File, "/a/link"));
    }

    #[test]
    fn test_unreadable_subtree_is_skipped() {
        let tree = walk(
            MemoryTree::new()
                .file("/ok/file")
                .file("/locked/secret")
                .unreadable("/locked"),
        );

        assert_eq!(tree.status, LayerStatus::Partial);
        assert!(tree.paths.contains(PathKind::File, "/ok/file"));
        assert!(tree.paths.contains(PathKind::Directory, "/locked"));
        assert!(!tree.paths.contains(PathKind::File, "/locked/secret"));
        let warning = &tree.warnings[0];
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
        assert_eq!(warning.path, PathBuf::from("/layer/locked"));
    }

    #[test]
    fn test_file_root() {
        let tree = walk(MemoryTree::file_root());
        assert_eq!(tree.status, LayerStatus::Complete);
        assert_eq!(tree.stats.max_depth, 0);
        assert!(tree.paths.is_empty());
    }

    #[test]
    fn test_unknown_root() {
        let walker = MemoryWalker::new();
        let tree = walker.walk(&Layer::new(3, "/nowhere"), &WalkBudget::unlimited());
        assert_eq!(tree.status, LayerStatus::Unusable);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let deep = (0..1_000).map(|i| format!("d{i}")).collect::<Vec<_>>().join("/");
        let tree = walk(MemoryTree::new().file(&format!("/{deep}/leaf")));
        assert_eq!(tree.stats.max_depth, 1_001);
        assert_eq!(tree.stats.dir_count, 1_001);
    }
}
