//! Stage executors.
//!
//! An executor turns one [`WorkItem`] into an [`ExecutionOutcome`]. It holds
//! only its collaborator; all run state lives in the stores and all
//! settings arrive through the [`AppConfig`] passed to every call.
//! Executors report problems as [`ExecutionOutcome::Failure`] values; the
//! runner treats panics and deadline overruns the same way.

mod ad_copy;
mod export;
mod image;
mod import;
mod items;
mod prompts;
mod ugc_script;
mod ugc_video;

pub use ad_copy::AdCopyExecutor;
pub use export::{ExportOutcome, ExportStage};
pub use image::{ImageEnhanceExecutor, SCENE_THEMES};
pub use import::{ImportOutcome, ImportStage};
pub use items::{ad_copy_items, image_items, ugc_script_items, ugc_video_items};
pub use prompts::{ad_angle, AD_ANGLES};
pub use ugc_script::UgcScriptExecutor;
pub use ugc_video::{preview_video_renders, UgcVideoExecutor};

use async_trait::async_trait;
use std::fmt::Debug;

use crate::collaborators::RenderStatus;
use crate::config::AppConfig;
use crate::core::{Artifact, StageName, WorkItem};
use crate::errors::{RemoteError, StageFailure};
use crate::utils::Timestamp;

/// Result of one executor invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// A finished artifact, ready for the store.
    Artifact(Artifact),
    /// A remote job that must be polled to completion.
    AsyncHandle(JobHandle),
    /// A classified item failure.
    Failure(StageFailure),
}

impl From<StageFailure> for ExecutionOutcome {
    fn from(failure: StageFailure) -> Self {
        Self::Failure(failure)
    }
}

impl From<RemoteError> for ExecutionOutcome {
    fn from(err: RemoteError) -> Self {
        Self::Failure(err.into())
    }
}

/// An in-flight remote job. Lives only inside one poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    /// Job id assigned by the remote.
    pub job_id: String,
    /// When the job was accepted.
    pub submitted_at: Timestamp,
    /// Status requests made so far.
    pub attempts: u32,
    /// The item the job renders.
    pub item: WorkItem,
}

impl JobHandle {
    /// Creates a handle for a freshly submitted job.
    #[must_use]
    pub fn new(job_id: impl Into<String>, item: WorkItem) -> Self {
        Self {
            job_id: job_id.into(),
            submitted_at: chrono::Utc::now(),
            attempts: 0,
            item,
        }
    }
}

/// Produces artifacts for one stage.
#[async_trait]
pub trait StageExecutor: Send + Sync + Debug {
    /// The stage this executor serves.
    fn stage(&self) -> StageName;

    /// Processes one item.
    async fn execute(&self, item: &WorkItem, config: &AppConfig) -> ExecutionOutcome;
}

/// Follows remote jobs started by an executor.
#[async_trait]
pub trait JobTracker: Send + Sync {
    /// Requests the current status of a job.
    async fn poll(&self, handle: &JobHandle) -> Result<RenderStatus, RemoteError>;

    /// Converts a completed job into its artifact.
    fn into_artifact(&self, handle: &JobHandle, status: &RenderStatus) -> Result<Artifact, StageFailure>;
}

fn wrong_item(stage: StageName, item: &WorkItem) -> ExecutionOutcome {
    ExecutionOutcome::Failure(StageFailure::unexpected(format!(
        "{stage} executor received {}",
        item.label()
    )))
}
