//! Final export of the artifact stores.

use std::path::PathBuf;

use crate::collaborators::Exporter;
use crate::errors::FlowError;
use crate::store::StoreSet;

/// Result of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Files written.
    pub files: Vec<PathBuf>,
    /// Artifacts included.
    pub exported: usize,
}

/// Hands the stored ad copies, scripts and videos to an exporter.
pub struct ExportStage<'a> {
    exporter: &'a dyn Exporter,
    stores: &'a StoreSet,
}

impl<'a> ExportStage<'a> {
    /// Creates the stage.
    #[must_use]
    pub fn new(exporter: &'a dyn Exporter, stores: &'a StoreSet) -> Self {
        Self { exporter, stores }
    }

    /// Runs the export. Empty stores produce no files.
    pub async fn run(&self) -> Result<ExportOutcome, FlowError> {
        let ads = self.stores.ad_copies.load_all()?;
        let scripts = self.stores.ugc_scripts.load_all()?;
        let videos = self.stores.ugc_videos.load_all()?;
        let exported = ads.len() + scripts.len() + videos.len();

        if exported == 0 {
            tracing::warn!("Nothing to export");
            return Ok(ExportOutcome::default());
        }

        let files = self.exporter.export(&ads, &scripts, &videos).await?;
        Ok(ExportOutcome { files, exported })
    }
}
