//! Average file depth.

use layerscope_core::Metric;

/// Sums the depth of every file in a layer.
///
/// A file found at depth `d` contributes `d`; directories contribute
/// nothing. The average over zero files is [`Metric::Undefined`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthAccumulator {
    total_depth: u64,
    files: u64,
}

impl DepthAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file found at `depth`.
    pub fn record(&mut self, depth: u32) {
        self.total_depth += u64::from(depth);
        self.files += 1;
    }

    /// Sum of all recorded depths.
    pub fn total_depth(&self) -> u64 {
        self.total_depth
    }

    /// Number of files recorded.
    pub fn file_count(&self) -> u64 {
        self.files
    }

    /// Mean file depth.
    pub fn average(&self) -> Metric {
        Metric::ratio(self.total_depth, self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_files_is_undefined() {
        assert!(DepthAccumulator::new().average().is_undefined());
    }

    #[test]
    fn test_average() {
        let mut acc = DepthAccumulator::new();
        acc.record(1);
        acc.record(2);
        acc.record(3);
        assert_eq!(acc.total_depth(), 6);
        assert_eq!(acc.average(), Metric::Value(2.0));
    }
}
