//! Layer-relative paths and per-layer path sets.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Separator between components of a [`RelativePath`].
pub const SEPARATOR: char = '/';

/// Escape character for names that are not plain UTF-8.
pub const ESCAPE: char = '\\';

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A path with its layer's root prefix removed.
///
/// Always starts with `/`; the layer root itself is `/`. Two paths from
/// different layers are the same path iff their strings are equal.
///
/// Names taken from the filesystem are stored escaped: `\` becomes `\\`
/// and every byte that is not valid UTF-8 becomes `\xNN`. The encoding is
/// reversible, so distinct names never share a string. [`RelativePath::new`]
/// takes a path that is already in this form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePath(CompactString);

impl RelativePath {
    /// The layer root.
    pub fn root() -> Self {
        Self(CompactString::new("/"))
    }

    /// Wrap a path string, adding the leading separator if it is missing.
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        if path.starts_with(SEPARATOR) {
            Self(CompactString::new(path))
        } else {
            let mut s = CompactString::with_capacity(path.len() + 1);
            s.push(SEPARATOR);
            s.push_str(path);
            Self(s)
        }
    }

    /// Build from a path that is already relative to the layer root.
    ///
    /// Only normal components are kept, so `""` and `"."` map to the root.
    pub fn from_relative(relative: &Path) -> Self {
        let mut s = CompactString::default();
        for component in relative.components() {
            if let Component::Normal(name) = component {
                s.push(SEPARATOR);
                push_escaped(&mut s, name);
            }
        }
        if s.is_empty() {
            return Self::root();
        }
        Self(s)
    }

    /// Strip `root` from `path`. Returns `None` if `path` is not under `root`.
    pub fn strip(root: &Path, path: &Path) -> Option<Self> {
        path.strip_prefix(root).ok().map(Self::from_relative)
    }

    /// Append one raw component name, escaping it.
    pub fn join(&self, name: impl AsRef<OsStr>) -> Self {
        let mut s = self.0.clone();
        if !self.is_root() {
            s.push(SEPARATOR);
        }
        push_escaped(&mut s, name.as_ref());
        Self(s)
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(0) | None => Some(Self::root()),
            Some(pos) => Some(Self(CompactString::new(&self.0[..pos]))),
        }
    }

    /// Last component, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    /// Non-empty components in order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|c| !c.is_empty())
    }

    /// Number of components. The root has depth 0.
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// Check if this is the layer root.
    pub fn is_root(&self) -> bool {
        self.depth() == 0
    }

    /// The path as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Append `name` in escaped form.
fn push_escaped(s: &mut CompactString, name: &OsStr) {
    for chunk in name.as_encoded_bytes().utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == ESCAPE {
                s.push(ESCAPE);
            }
            s.push(c);
        }
        for &byte in chunk.invalid() {
            s.push(ESCAPE);
            s.push('x');
            s.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            s.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
        }
    }
}

// Hashes as `str` so sets can be queried with `&str` through `Borrow`.
impl Hash for RelativePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for RelativePath {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RelativePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Kind of path compared across layers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    /// Any entry that is not a directory (regular files, symlinks, devices).
    File,
    /// Directories, including the layer root.
    Directory,
}

/// The file paths and directory paths of one layer.
///
/// Built once through [`PathSetBuilder`] and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSet {
    files: HashSet<RelativePath>,
    directories: HashSet<RelativePath>,
}

impl PathSet {
    /// Create a new path set builder.
    pub fn builder() -> PathSetBuilder {
        PathSetBuilder::default()
    }

    /// Build a path set from literal file and directory paths.
    pub fn from_paths<'a>(
        files: impl IntoIterator<Item = &'a str>,
        directories: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut builder = Self::builder();
        for file in files {
            builder.insert(PathKind::File, RelativePath::new(file));
        }
        for dir in directories {
            builder.insert(PathKind::Directory, RelativePath::new(dir));
        }
        builder.build()
    }

    /// All paths of `kind`.
    pub fn paths(&self, kind: PathKind) -> &HashSet<RelativePath> {
        match kind {
            PathKind::File => &self.files,
            PathKind::Directory => &self.directories,
        }
    }

    /// Exact-string membership test.
    pub fn contains(&self, kind: PathKind, path: &str) -> bool {
        self.paths(kind).contains(path)
    }

    /// Number of paths of `kind`.
    pub fn len(&self, kind: PathKind) -> usize {
        self.paths(kind).len()
    }

    /// Number of paths of both kinds.
    pub fn total_len(&self) -> usize {
        self.files.len() + self.directories.len()
    }

    /// Check if the set has no paths at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

/// Accumulates paths for a [`PathSet`].
#[derive(Debug, Default)]
pub struct PathSetBuilder {
    files: HashSet<RelativePath>,
    directories: HashSet<RelativePath>,
}

impl PathSetBuilder {
    /// Add a path. Returns `false` if it was already present.
    pub fn insert(&mut self, kind: PathKind, path: RelativePath) -> bool {
        match kind {
            PathKind::File => self.files.insert(path),
            PathKind::Directory => self.directories.insert(path),
        }
    }

    /// Finish building.
    pub fn build(self) -> PathSet {
        PathSet {
            files: self.files,
            directories: self.directories,
        }
    }
}
