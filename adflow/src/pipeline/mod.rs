//! Pipeline orchestration.
//!
//! This module provides:
//! - Stage selection from run flags
//! - The orchestrator that sequences a run
//! - Run summaries

mod orchestrator;
mod plan;
mod result;


pub use orchestrator::Orchestrator;
pub use plan::StagePlan;
pub use result::{RunResult, StageReport, StoreCounts};
