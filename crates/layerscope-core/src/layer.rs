//! Layers and ordered layer stacks.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Separator used by overlay `lowerdir` lists.
const LOWERDIR_SEPARATOR: char = ':';

/// One directory tree in a union-mount stack.
///
/// Index 0 is the topmost (most recently written) layer; larger indices
/// are lower and older.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layer {
    /// Position in the stack.
    pub index: usize,
    /// Mount-point path of the layer root.
    pub root: PathBuf,
}

impl Layer {
    /// Create a new layer.
    pub fn new(index: usize, root: impl Into<PathBuf>) -> Self {
        Self {
            index,
            root: root.into(),
        }
    }

    /// Whether this is the topmost layer.
    pub fn is_top(&self) -> bool {
        self.index == 0
    }
}

/// Ordered list of layers, topmost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Build a stack from layer roots, topmost first.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let layers = roots
            .into_iter()
            .enumerate()
            .map(|(index, root)| Layer::new(index, root))
            .collect();
        Self { layers }
    }

    /// Build a stack from an overlay upper directory and a `lowerdir` list.
    ///
    /// The lower list keeps its given order. Empty segments are skipped.
    pub fn from_overlay_dirs(upper: Option<&Path>, lower: Option<&str>) -> Self {
        let lower = lower
            .into_iter()
            .flat_map(|list| list.split(LOWERDIR_SEPARATOR))
            .filter(|segment| !segment.is_empty())
            .map(PathBuf::from);

        Self::new(upper.map(Path::to_path_buf).into_iter().chain(lower))
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if the stack has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get a layer by index.
    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// The topmost layer.
    pub fn top(&self) -> Option<&Layer> {
        self.layers.first()
    }

    /// Iterate layers topmost first.
    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    /// Layers as a slice, topmost first.
    pub fn as_slice(&self) -> &[Layer] {
        &self.layers
    }

    /// Indices of every layer strictly below `index`, in stack order.
    pub fn lower_indices(&self, index: usize) -> Range<usize> {
        let start = index.saturating_add(1).min(self.layers.len());
        start..self.layers.len()
    }
}

impl<'a> IntoIterator for &'a LayerStack {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}
