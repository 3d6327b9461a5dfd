//! Bounded polling of remote jobs.
//!
//! ```text
//! Submitted -> Rendering -> Completed
//!                        -> Failed
//!                        -> TimedOut
//! ```
//!
//! Every status request consumes one attempt, including requests that
//! fail in transit. After `max_attempts` requests without a terminal
//! status the job times out.

use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;

use crate::config::PollSettings;
use crate::core::Artifact;
use crate::errors::{FailureKind, StageFailure};
use crate::events::{EventSink, JOB_POLLED, JOB_RESOLVED, JOB_SUBMITTED};
use crate::stages::{JobHandle, JobTracker};

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted by the remote, not polled yet.
    Submitted,
    /// Polled at least once without a terminal status.
    Rendering,
    /// Finished and converted into an artifact.
    Completed,
    /// The remote reported a failure, or the result was unusable.
    Failed,
    /// The attempt budget ran out.
    TimedOut,
}

impl JobState {
    /// Returns true for terminal states.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Rendering => "rendering",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

/// Terminal result of polling one job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The job finished; its artifact is ready for the store.
    Completed {
        /// The converted artifact.
        artifact: Artifact,
        /// Status requests made.
        attempts: u32,
    },
    /// The job failed.
    Failed {
        /// Why.
        failure: StageFailure,
        /// Status requests made.
        attempts: u32,
    },
    /// No terminal status within the attempt budget.
    TimedOut {
        /// Status requests made.
        attempts: u32,
        /// Time spent polling.
        waited: Duration,
    },
}

impl JobOutcome {
    /// The terminal state.
    #[must_use]
    pub fn state(&self) -> JobState {
        match self {
            Self::Completed { .. } => JobState::Completed,
            Self::Failed { .. } => JobState::Failed,
            Self::TimedOut { .. } => JobState::TimedOut,
        }
    }

    /// Status requests made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Converts into the artifact or the item failure.
    pub fn into_result(self) -> Result<Artifact, StageFailure> {
        match self {
            Self::Completed { artifact, .. } => Ok(artifact),
            Self::Failed { failure, .. } => Err(failure),
            Self::TimedOut { attempts, waited } => Err(StageFailure::new(
                FailureKind::Timeout,
                format!("no terminal status after {attempts} polls ({}s)", waited.as_secs()),
            )),
        }
    }
}

/// Polls one job at a time until it reaches a terminal state.
pub struct AsyncJobPoller<'a> {
    tracker: &'a dyn JobTracker,
    settings: PollSettings,
    events: &'a dyn EventSink,
}

impl<'a> AsyncJobPoller<'a> {
    /// Creates a poller.
    #[must_use]
    pub fn new(tracker: &'a dyn JobTracker, settings: PollSettings, events: &'a dyn EventSink) -> Self {
        Self {
            tracker,
            settings,
            events,
        }
    }

    /// Polls the job until it completes, fails or runs out of attempts.
    pub async fn resolve(&self, mut handle: JobHandle) -> JobOutcome {
        let started = tokio::time::Instant::now();
        let mut state = JobState::Submitted;
        tracing::info!(job_id = %handle.job_id, item = %handle.item.label(), "Job submitted");
        self.events
            .emit(
                JOB_SUBMITTED,
                Some(json!({"job_id": handle.job_id, "key": handle.item.key()})),
            )
            .await;

        let outcome = loop {
            if handle.attempts >= self.settings.max_attempts {
                break JobOutcome::TimedOut {
                    attempts: handle.attempts,
                    waited: started.elapsed(),
                };
            }
            if handle.attempts > 0 && !self.settings.interval.is_zero() {
                tokio::time::sleep(self.settings.interval).await;
            }
            handle.attempts += 1;

            let polled = tokio::time::timeout(self.settings.request_timeout, self.tracker.poll(&handle)).await;
            let status = match polled {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    tracing::warn!(job_id = %handle.job_id, attempt = handle.attempts, error = %e, "Status request failed");
                    self.emit_polled(&handle, "transport_error").await;
                    continue;
                }
                Err(_) => {
                    tracing::warn!(job_id = %handle.job_id, attempt = handle.attempts, "Status request timed out");
                    self.emit_polled(&handle, "timeout").await;
                    continue;
                }
            };
            self.emit_polled(&handle, &status.status).await;

            if status.is_completed() {
                break match self.tracker.into_artifact(&handle, &status) {
                    Ok(artifact) => JobOutcome::Completed {
                        artifact,
                        attempts: handle.attempts,
                    },
                    Err(failure) => JobOutcome::Failed {
                        failure,
                        attempts: handle.attempts,
                    },
                };
            }
            if status.is_failed() {
                let reason = status.error.clone().unwrap_or_else(|| status.status.clone());
                break JobOutcome::Failed {
                    failure: StageFailure::new(FailureKind::RemoteRejected, format!("render failed: {reason}")),
                    attempts: handle.attempts,
                };
            }

            if state == JobState::Submitted {
                state = JobState::Rendering;
            }
            tracing::debug!(job_id = %handle.job_id, attempt = handle.attempts, status = %status.status, state = %state, "Still rendering");
        };

        tracing::info!(
            job_id = %handle.job_id,
            state = %outcome.state(),
            attempts = outcome.attempts(),
            "Job resolved"
        );
        self.events
            .emit(
                JOB_RESOLVED,
                Some(json!({
                    "job_id": handle.job_id,
                    "state": outcome.state(),
                    "attempts": outcome.attempts(),
                })),
            )
            .await;
        outcome
    }

    async fn emit_polled(&self, handle: &JobHandle, status: &str) {
        self.events
            .emit(
                JOB_POLLED,
                Some(json!({"job_id": handle.job_id, "attempt": handle.attempts, "status": status})),
            )
            .await;
    }
}
