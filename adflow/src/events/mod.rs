//! Pipeline events.
//!
//! The orchestrator and the runners report progress through an
//! [`EventSink`] handed to them at construction. Event types are dotted
//! names; payloads are small JSON objects that always carry the stage name
//! when one applies.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A run started.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// A run finished, successfully or not.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// A run stopped early on a fatal condition.
pub const PIPELINE_ABORTED: &str = "pipeline.aborted";
/// A stage moved to running.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage reached a terminal status.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// An item produced a new artifact.
pub const ITEM_GENERATED: &str = "item.generated";
/// An item was already stored.
pub const ITEM_SKIPPED: &str = "item.skipped";
/// An item failed.
pub const ITEM_FAILED: &str = "item.failed";
/// A remote job was accepted.
pub const JOB_SUBMITTED: &str = "job.submitted";
/// A remote job status was requested.
pub const JOB_POLLED: &str = "job.polled";
/// A remote job reached a terminal state.
pub const JOB_RESOLVED: &str = "job.resolved";
