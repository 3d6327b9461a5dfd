//! Run summaries.

use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;
use uuid::Uuid;

use crate::core::{StageName, StageStatus};
use crate::runner::StageTally;
use crate::utils::{format_elapsed, format_iso8601, Timestamp};

/// Outcome of one stage within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// The stage.
    pub stage: StageName,
    /// Terminal status.
    pub status: StageStatus,
    /// Item counts.
    pub tally: StageTally,
    /// Stage-level error or skip reason.
    pub error: Option<String>,
    /// Time spent in the stage.
    pub elapsed: Duration,
}

impl StageReport {
    /// A stage that did not run.
    #[must_use]
    pub fn skipped(stage: StageName, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            tally: StageTally::default(),
            error: Some(reason.into()),
            elapsed: Duration::ZERO,
        }
    }

    /// A stage that finished; failed when any item failed.
    #[must_use]
    pub fn finished(stage: StageName, tally: StageTally, elapsed: Duration) -> Self {
        let status = if tally.has_failures() {
            StageStatus::Failed
        } else {
            StageStatus::Ok
        };
        Self {
            stage,
            status,
            tally,
            error: None,
            elapsed,
        }
    }

    /// A stage that hit a stage-level error.
    #[must_use]
    pub fn errored(stage: StageName, tally: StageTally, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            tally,
            error: Some(error.into()),
            elapsed,
        }
    }
}

/// Artifact counts across the stores at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    /// Catalog products.
    pub products: usize,
    /// Enhanced images.
    pub enhanced_images: usize,
    /// Ad copies.
    pub ad_copies: usize,
    /// UGC scripts.
    pub ugc_scripts: usize,
    /// UGC videos.
    pub ugc_videos: usize,
}

/// Summary of one pipeline run. Returned to the caller, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Unique run id.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: Timestamp,
    /// One report per stage, in execution order.
    pub stages: Vec<StageReport>,
    /// Store sizes after the run.
    pub counts: StoreCounts,
    /// True if the run stopped on a fatal condition.
    pub aborted: bool,
    /// Total wall-clock time.
    pub elapsed: Duration,
}

impl RunResult {
    /// Starts an empty result.
    #[must_use]
    pub fn new(started_at: Timestamp) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            stages: Vec::new(),
            counts: StoreCounts::default(),
            aborted: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns the report for `stage`.
    #[must_use]
    pub fn stage(&self, stage: StageName) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Returns the status of `stage`; stages never reached are pending.
    #[must_use]
    pub fn status_of(&self, stage: StageName) -> StageStatus {
        self.stage(stage).map_or(StageStatus::Pending, |r| r.status)
    }

    /// Names of the failed stages, in execution order.
    #[must_use]
    pub fn failed_stages(&self) -> Vec<StageName> {
        self.stages
            .iter()
            .filter(|r| r.status.is_failure())
            .map(|r| r.stage)
            .collect()
    }

    /// Returns true if the run completed without failed stages.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed_stages().is_empty()
    }

    /// Sum of all stage tallies.
    #[must_use]
    pub fn totals(&self) -> StageTally {
        self.stages.iter().fold(StageTally::default(), |acc, r| StageTally {
            generated: acc.generated + r.tally.generated,
            skipped: acc.skipped + r.tally.skipped,
            failed: acc.failed + r.tally.failed,
        })
    }

    /// Renders the summary printed at the end of a CLI run.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Run {} started {}", self.run_id, format_iso8601(&self.started_at));
        for report in &self.stages {
            let _ = write!(out, "  {:<14} {:<8}", report.stage.as_str(), report.status.to_string());
            if report.status != StageStatus::Skipped {
                let _ = write!(out, " {}", report.tally);
            }
            if let Some(error) = &report.error {
                let _ = write!(out, " ({error})");
            }
            out.push('\n');
        }
        let c = &self.counts;
        let _ = writeln!(
            out,
            "Stores: products={} enhanced_images={} ad_copies={} ugc_scripts={} ugc_videos={}",
            c.products, c.enhanced_images, c.ad_copies, c.ugc_scripts, c.ugc_videos
        );
        if self.aborted {
            out.push_str("Run aborted\n");
        } else {
            let failed = self.failed_stages();
            if !failed.is_empty() {
                let names: Vec<_> = failed.iter().map(StageName::as_str).collect();
                let _ = writeln!(out, "Failed stages: {}", names.join(", "));
            }
        }
        let _ = write!(out, "Elapsed: {}", format_elapsed(self.elapsed));
        out
    }
}
