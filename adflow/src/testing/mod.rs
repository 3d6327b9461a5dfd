//! Testing utilities for adflow pipelines.
//!
//! This module provides:
//! - Scripted executors, collaborators and job trackers
//! - Fixture products, work items and artifacts

pub mod fixtures;
mod mocks;

pub use mocks::{
    CannedTextGenerator, RecordingExporter, ScriptedBackgroundRemover, ScriptedCatalog,
    ScriptedExecutor, ScriptedRenderer, ScriptedSceneGenerator, ScriptedStep, ScriptedTracker,
};
