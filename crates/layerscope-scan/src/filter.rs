//! Entry filtering by name.

use std::ffi::OsStr;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use layerscope_core::{AnalysisError, AnalyzeConfig};

/// Decides which entries a walk skips, along with everything beneath them.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    include_hidden: bool,
    exclude: GlobSet,
}

impl EntryFilter {
    /// A filter that keeps every entry.
    pub fn allow_all() -> Self {
        Self {
            include_hidden: true,
            exclude: GlobSet::empty(),
        }
    }

    /// Build a filter from the hidden-entry and exclusion settings.
    pub fn from_config(config: &AnalyzeConfig) -> Result<Self, AnalysisError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|e| AnalysisError::InvalidConfig {
                message: format!("Invalid exclude pattern '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|e| AnalysisError::InvalidConfig {
            message: format!("Invalid exclude patterns: {e}"),
        })?;

        Ok(Self {
            include_hidden: config.include_hidden,
            exclude,
        })
    }

    /// Whether hidden entries are kept.
    pub fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Check if `name` matches an exclusion pattern. Names are matched as raw bytes.
    pub fn matches_exclusion(&self, name: impl AsRef<OsStr>) -> bool {
        self.exclude.is_match(Path::new(name.as_ref()))
    }

    /// Check if an entry named `name` is skipped.
    pub fn is_excluded(&self, name: impl AsRef<OsStr>) -> bool {
        let name = name.as_ref();
        let hidden = name.as_encoded_bytes().starts_with(b".");
        (!self.include_hidden && hidden) || self.matches_exclusion(name)
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let filter = EntryFilter::allow_all();
        assert!(!filter.is_excluded(".wh.foo"));
        assert!(!filter.is_excluded("etc"));
    }

    #[test]
    fn test_exclude_patterns() {
        let config = AnalyzeConfig::builder()
            .exclude_patterns(vec![".wh.*".to_string(), "*.pyc".to_string()])
            .build()
            .unwrap();
        let filter = EntryFilter::from_config(&config).unwrap();

        assert!(filter.is_excluded(".wh..wh..opq"));
        assert!(filter.is_excluded("mod.pyc"));
        assert!(!filter.is_excluded("mod.py"));
    }

    #[test]
    fn test_hidden() {
        let config = AnalyzeConfig::builder()
            .include_hidden(false)
            .build()
            .unwrap();
        let filter = EntryFilter::from_config(&config).unwrap();

        assert!(filter.is_excluded(".bashrc"));
        assert!(!filter.matches_exclusion(".bashrc"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_match_by_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let config = AnalyzeConfig::builder()
            .exclude_patterns(vec!["*.tmp".to_string()])
            .build()
            .unwrap();
        let filter = EntryFilter::from_config(&config).unwrap();

        assert!(filter.is_excluded(OsStr::from_bytes(b"cache\xff.tmp")));
        assert!(!filter.is_excluded(OsStr::from_bytes(b"cache\xff.dat")));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = AnalyzeConfig::builder()
            .exclude_patterns(vec!["[".to_string()])
            .build()
            .unwrap();
        assert!(matches!(
            EntryFilter::from_config(&config),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }
}
