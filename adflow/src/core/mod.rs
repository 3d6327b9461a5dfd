//! Core domain model types for adflow.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - Content keys and their derivation
//! - Products, work items and artifacts
//! - Stage names and statuses

mod artifact;
mod catalog;
mod key;
mod status;
mod work_item;

pub use artifact::{
    AdCopy, Artifact, ArtifactStatus, EnhancedImage, Payload, Scene, UgcScript, UgcVideo,
};
pub use catalog::{Product, ProductRecord};
pub use key::{ContentKey, KEY_DELIMITER};
pub use status::{StageName, StageStatus};
pub use work_item::WorkItem;
