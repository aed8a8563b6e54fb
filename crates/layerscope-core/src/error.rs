//! Error and warning types for layer analysis.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::PathKind;

/// Errors raised while walking a single subtree of a layer.
///
/// These never abort a walk. The walker turns each one into a
/// [`LayerWarning`] on the affected layer and carries on with the
/// sibling subtrees.
#[derive(Debug, Error)]
pub enum TraversalError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path disappeared while it was being walked.
    #[error("Path vanished during walk: {path}")]
    Vanished { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Metadata for an entry could not be read.
    #[error("Cannot read metadata for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// The walk was cancelled or ran past its deadline.
    #[error("Walk cancelled at {path}")]
    Cancelled { path: PathBuf },
}

impl TraversalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::Vanished { path },
            _ => Self::Io {
                path,
                message: source.to_string(),
            },
        }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied { path }
            | Self::Vanished { path }
            | Self::Io { path, .. }
            | Self::Metadata { path, .. }
            | Self::Cancelled { path } => path,
        }
    }

    /// Warning kind this error degrades into.
    pub fn warning_kind(&self) -> WarningKind {
        match self {
            Self::PermissionDenied { .. } => WarningKind::PermissionDenied,
            Self::Vanished { .. } => WarningKind::Vanished,
            Self::Io { .. } => WarningKind::ReadError,
            Self::Metadata { .. } => WarningKind::MetadataError,
            Self::Cancelled { .. } => WarningKind::Cancelled,
        }
    }
}

/// Errors for malformed input and invalid queries.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The layer list is empty.
    #[error("Layer stack is empty")]
    EmptyStack,

    /// A layer root does not exist.
    #[error("Layer root does not exist: {path}")]
    MissingRoot { path: PathBuf },

    /// A layer root exists but cannot be opened.
    #[error("Layer root is unreadable: {path}: {message}")]
    UnreadableRoot { path: PathBuf, message: String },

    /// A layer index is outside the stack.
    #[error("No layer at index {index} (stack has {len} layers)")]
    UnknownLayer { index: usize, len: usize },

    /// A similarity query named a lower layer that is not strictly below the target.
    #[error("Layer {lower} is not below layer {layer}")]
    NotALowerLayer { layer: usize, lower: usize },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl AnalysisError {
    /// Classify a failure to open a layer root.
    pub fn root(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::MissingRoot { path },
            _ => Self::UnreadableRoot {
                path,
                message: source.to_string(),
            },
        }
    }
}

/// Kind of layer warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// An entry vanished mid-walk.
    Vanished,
    /// Error reading a directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// The walk was cancelled or timed out; results are partial.
    Cancelled,
    /// The layer has no file paths.
    EmptyFiles,
    /// The layer has no directory paths.
    EmptyDirectories,
    /// The layer root is missing or unreadable.
    MalformedLayer,
    /// The stack has no layers at all.
    EmptyStack,
}

impl WarningKind {
    /// Whether this warning means the layer's data is incomplete.
    pub fn is_traversal(self) -> bool {
        matches!(
            self,
            Self::PermissionDenied
                | Self::Vanished
                | Self::ReadError
                | Self::MetadataError
                | Self::Cancelled
        )
    }
}

/// Non-fatal warning attached to a layer record or a stack report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl LayerWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a layer without paths of `kind`.
    pub fn empty(root: impl Into<PathBuf>, kind: PathKind) -> Self {
        let root = root.into();
        let (message, kind) = match kind {
            PathKind::File => (
                format!("Layer has no files: {}", root.display()),
                WarningKind::EmptyFiles,
            ),
            PathKind::Directory => (
                format!("Layer has no directories: {}", root.display()),
                WarningKind::EmptyDirectories,
            ),
        };
        Self {
            path: root,
            message,
            kind,
        }
    }

    /// Create a warning for an empty layer stack.
    pub fn empty_stack() -> Self {
        Self {
            path: PathBuf::new(),
            message: AnalysisError::EmptyStack.to_string(),
            kind: WarningKind::EmptyStack,
        }
    }

    /// Create a warning for a layer whose root cannot be used.
    pub fn malformed(path: impl Into<PathBuf>, error: &AnalysisError) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
            kind: WarningKind::MalformedLayer,
        }
    }
}

impl From<&TraversalError> for LayerWarning {
    fn from(error: &TraversalError) -> Self {
        Self {
            path: error.path().to_path_buf(),
            message: error.to_string(),
            kind: error.warning_kind(),
        }
    }
}

impl From<TraversalError> for LayerWarning {
    fn from(error: TraversalError) -> Self {
        Self::from(&error)
    }
}
