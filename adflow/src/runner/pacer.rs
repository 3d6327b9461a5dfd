//! Minimum spacing between remote calls.

use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Enforces a minimum delay between consecutive calls.
///
/// The first call never waits. Later calls wait until `min_interval` has
/// passed since the previous call finished.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl Pacer {
    /// Creates a pacer.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Returns the configured spacing.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next call is allowed.
    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
    }

    /// Records that a call just finished.
    pub fn mark(&mut self) {
        self.last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_does_not_wait() {
        let pacer = Pacer::new(Duration::from_secs(60));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_enforces_spacing() {
        let mut pacer = Pacer::new(Duration::from_millis(40));
        pacer.mark();
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn test_zero_interval() {
        let mut pacer = Pacer::new(Duration::ZERO);
        pacer.mark();
        pacer.wait().await;
        assert_eq!(pacer.min_interval(), Duration::ZERO);
    }
}
