//! # Adflow
//!
//! An idempotent, multi-stage pipeline that turns a product catalog into
//! platform ad copy, UGC video scripts and rendered UGC videos.
//!
//! Adflow provides:
//!
//! - **Content keys**: every work item has a deterministic key, so reruns
//!   skip what is already stored
//! - **JSON artifact stores**: one file per stage, merged by key and written
//!   atomically
//! - **Paced stage runners**: sequential executor calls with a minimum
//!   interval, per-call deadlines and isolated item failures
//! - **Remote job polling**: bounded polling of asynchronous video renders
//! - **Orchestration**: a fixed stage order where only a failed import on an
//!   empty catalog stops the run
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adflow::prelude::*;
//!
//! let config = AppConfig::load("config", "data")?.with_feed("products.json");
//! let collaborators = Collaborators::from_config(&config)?;
//!
//! let result = Orchestrator::new(config, collaborators).run().await;
//! println!("{}", result.render());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod collaborators;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod runner;
pub mod stages;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collaborators::{
        BackgroundRemover, CatalogSource, Collaborators, Exporter, SceneGenerator, TextGenerator,
        VideoRenderer,
    };
    pub use crate::config::{AppConfig, PipelineSettings, RunFilters, RunFlags};
    pub use crate::core::{Artifact, ContentKey, Product, StageName, StageStatus, WorkItem};
    pub use crate::errors::{FailureKind, FlowError, RemoteError, StageFailure};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{Orchestrator, RunResult, StagePlan, StageReport};
    pub use crate::runner::{AsyncJobPoller, RateLimitedRunner, StageTally};
    pub use crate::stages::{ExecutionOutcome, JobHandle, JobTracker, StageExecutor};
    pub use crate::store::{JsonStore, MergePolicy, StoreSet};
    pub use crate::utils::{iso_timestamp, Timestamp};
}
