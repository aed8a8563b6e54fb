//! Cancellation and deadlines for layer walks.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Limits how long a walk may run.
///
/// A walk stops visiting subtrees once the token is cancelled or the
/// deadline passes, and returns what it collected so far.
#[derive(Debug, Clone, Default)]
pub struct WalkBudget {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl WalkBudget {
    /// A budget that never runs out unless cancelled.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A budget that runs out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(CancellationToken::new(), Some(timeout))
    }

    /// A budget tied to an external token and an optional timeout.
    pub fn new(token: CancellationToken, timeout: Option<Duration>) -> Self {
        Self {
            token,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// The cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel every walk sharing this budget.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if the walk should stop.
    pub fn is_exhausted(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_budget() {
        let budget = WalkBudget::unlimited();
        assert!(!budget.is_exhausted());
        budget.cancel();
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_shared_token() {
        let token = CancellationToken::new();
        let budget = WalkBudget::new(token.clone(), None);
        let clone = budget.clone();
        token.cancel();
        assert!(budget.is_exhausted());
        assert!(clone.is_exhausted());
    }

    #[test]
    fn test_elapsed_deadline() {
        let budget = WalkBudget::with_timeout(Duration::ZERO);
        assert!(budget.is_exhausted());
    }
}
