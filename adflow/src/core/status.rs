//! Stage identity and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Pull product records into the catalog.
    Import,
    /// Background removal and scene generation for product images.
    ImageEnhance,
    /// Platform ad copy variations.
    AdCopy,
    /// UGC video scripts.
    UgcScript,
    /// Remote UGC video renders built from scripts.
    UgcVideo,
    /// Consolidated export of all artifact stores.
    Export,
}

impl StageName {
    /// All stages in the order the orchestrator runs them.
    pub const ORDER: [Self; 6] = [
        Self::Import,
        Self::ImageEnhance,
        Self::AdCopy,
        Self::UgcScript,
        Self::UgcVideo,
        Self::Export,
    ];

    /// Returns the snake_case name used in logs, events and summaries.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::ImageEnhance => "image_enhance",
            Self::AdCopy => "ad_copy",
            Self::UgcScript => "ugc_script",
            Self::UgcVideo => "ugc_video",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The execution status of a stage within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Currently running.
    Running,
    /// Completed without item or stage failures.
    Ok,
    /// At least one item failed, or the stage itself errored.
    Failed,
    /// Disabled by flags or missing collaborator.
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Ok => write!(f, "ok"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok | Self::Failed | Self::Skipped)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert_eq!(StageName::ORDER.first(), Some(&StageName::Import));
        assert_eq!(StageName::ORDER.last(), Some(&StageName::Export));
        let mut sorted = StageName::ORDER;
        sorted.sort();
        assert_eq!(sorted, StageName::ORDER);
    }

    #[test]
    fn test_stage_name_display() {
        assert_eq!(StageName::ImageEnhance.to_string(), "image_enhance");
        assert_eq!(StageName::UgcVideo.to_string(), "ugc_video");
    }

    #[test]
    fn test_stage_status_is_terminal() {
        assert!(StageStatus::Ok.is_terminal());
        assert!(StageStatus::Skipped.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
    }

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Skipped).unwrap();
        assert_eq!(json, r#""skipped""#);

        let deserialized: StageStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(deserialized, StageStatus::Failed);
    }
}
