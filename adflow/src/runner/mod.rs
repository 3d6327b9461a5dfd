//! Drivers that feed work items through executors.
//!
//! [`RateLimitedRunner`] walks a stage's items in order, skips keys that
//! are already stored, paces executor calls and flushes new artifacts to
//! the stage's store. Items whose executor hands back a remote job are
//! followed to completion by the [`AsyncJobPoller`] before the next item
//! starts.

mod pacer;
mod poller;
mod rate_limited;

pub use pacer::Pacer;
pub use poller::{AsyncJobPoller, JobOutcome, JobState};
pub use rate_limited::RateLimitedRunner;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-stage item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTally {
    /// New artifacts written.
    pub generated: usize,
    /// Items whose key was already stored.
    pub skipped: usize,
    /// Items that failed.
    pub failed: usize,
}

impl StageTally {
    /// Number of items seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.generated + self.skipped + self.failed
    }

    /// Returns true if any item failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for StageTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generated={} skipped={} failed={}",
            self.generated, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally() {
        let tally = StageTally {
            generated: 3,
            skipped: 2,
            failed: 1,
        };
        assert_eq!(tally.total(), 6);
        assert!(tally.has_failures());
        assert_eq!(tally.to_string(), "generated=3 skipped=2 failed=1");
        assert!(!StageTally::default().has_failures());
    }
}
