//! Walk progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a layer walk.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// Index of the layer being walked.
    pub layer: usize,
    /// Number of files seen so far.
    pub files_walked: u64,
    /// Number of directories seen so far.
    pub dirs_walked: u64,
    /// Current path being walked.
    pub current_path: PathBuf,
    /// Number of errors/warnings encountered.
    pub errors_count: u64,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
    /// Whether the walk of this layer has finished.
    pub finished: bool,
}

impl WalkProgress {
    /// Create initial progress state for a layer.
    pub fn new(layer: usize) -> Self {
        Self {
            layer,
            files_walked: 0,
            dirs_walked: 0,
            current_path: PathBuf::new(),
            errors_count: 0,
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Calculate walk rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_items() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items walked (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_walked + self.dirs_walked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_without_elapsed_time() {
        let mut progress = WalkProgress::new(2);
        progress.files_walked = 10;
        progress.dirs_walked = 5;
        assert_eq!(progress.total_items(), 15);
        assert_eq!(progress.entries_per_second(), 0.0);

        progress.elapsed = Duration::from_secs(3);
        assert_eq!(progress.entries_per_second(), 5.0);
    }
}
