//! Export collaborator.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::Artifact;
use crate::errors::ExportError;

/// Writes the final artifact collections somewhere useful.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Exports the collections and returns the produced file locations.
    async fn export(
        &self,
        ads: &[Artifact],
        scripts: &[Artifact],
        videos: &[Artifact],
    ) -> Result<Vec<PathBuf>, ExportError>;
}

/// Returns the exporter for a configured format.
///
/// JSON is the only export format. Any other value logs a warning and
/// exports JSON.
#[must_use]
pub fn exporter_for(format: &str, out_dir: impl Into<PathBuf>) -> JsonExporter {
    let format = format.trim().to_ascii_lowercase();
    if format != "json" {
        tracing::warn!(format = %format, "Unsupported export format, exporting json instead");
    }
    JsonExporter::new(out_dir)
}

/// Writes one consolidated `full_export_<timestamp>.json`.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct ExportSummary {
    total_ad_copies: usize,
    total_ugc_scripts: usize,
    total_ugc_videos: usize,
    platforms: BTreeSet<String>,
    ugc_types: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    exported_at: String,
    summary: ExportSummary,
    ad_copies: &'a [Artifact],
    ugc_scripts: &'a [Artifact],
    ugc_videos: &'a [Artifact],
}

impl JsonExporter {
    /// Creates an exporter writing into `out_dir`.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[async_trait]
impl Exporter for JsonExporter {
    async fn export(
        &self,
        ads: &[Artifact],
        scripts: &[Artifact],
        videos: &[Artifact],
    ) -> Result<Vec<PathBuf>, ExportError> {
        let summary = ExportSummary {
            total_ad_copies: ads.len(),
            total_ugc_scripts: scripts.len(),
            total_ugc_videos: videos.len(),
            platforms: ads
                .iter()
                .filter_map(Artifact::as_ad_copy)
                .map(|a| a.platform.clone())
                .collect(),
            ugc_types: scripts
                .iter()
                .filter_map(Artifact::as_ugc_script)
                .map(|s| s.ugc_type.clone())
                .collect(),
        };
        let now = chrono::Utc::now();
        let document = ExportDocument {
            exported_at: crate::utils::format_iso8601(&now),
            summary,
            ad_copies: ads,
            ugc_scripts: scripts,
            ugc_videos: videos,
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| ExportError::Serialize(e.to_string()))?;

        tokio::fs::create_dir_all(&self.out_dir).await?;
        let path = self
            .out_dir
            .join(format!("full_export_{}.json", crate::utils::file_stamp(&now)));
        tokio::fs::write(&path, json).await?;

        tracing::info!(path = %path.display(), ads = ads.len(), scripts = scripts.len(), videos = videos.len(), "Export written");
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AdCopy, ArtifactStatus, ContentKey, Payload, UgcScript};
    use tempfile::TempDir;

    fn ad(platform: &str) -> Artifact {
        Artifact::new(
            ContentKey::derive(&["p1", platform, "1"]),
            "p1",
            "Lamp",
            ArtifactStatus::Generated,
            Payload::AdCopy(AdCopy {
                platform: platform.to_string(),
                variation: 1,
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_exporter_for_falls_back_to_json() {
        assert_eq!(exporter_for("JSON", "out").out_dir(), Path::new("out"));
        assert_eq!(exporter_for("csv", "exports").out_dir(), Path::new("exports"));
        assert_eq!(exporter_for(" xlsx ", "exports").out_dir(), Path::new("exports"));
    }

    #[tokio::test]
    async fn test_json_export_document() {
        let dir = TempDir::new().unwrap();
        let exporter = JsonExporter::new(dir.path().join("exports"));
        let script = Artifact::new(
            ContentKey::derive(&["p1", "review"]),
            "p1",
            "Lamp",
            ArtifactStatus::Generated,
            Payload::UgcScript(UgcScript {
                ugc_type: "review".to_string(),
                ..Default::default()
            }),
        );

        let files = exporter
            .export(&[ad("meta"), ad("google"), ad("meta")], &[script], &[])
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("full_export_") && name.ends_with(".json"));

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(doc["summary"]["total_ad_copies"], 3);
        assert_eq!(doc["summary"]["platforms"], serde_json::json!(["google", "meta"]));
        assert_eq!(doc["summary"]["ugc_types"], serde_json::json!(["review"]));
        assert_eq!(doc["ugc_videos"], serde_json::json!([]));

        let exported_at = doc["exported_at"].as_str().unwrap();
        let stamp: String = exported_at[..19]
            .chars()
            .filter(|c| !matches!(c, '-' | ':'))
            .map(|c| if c == 'T' { '_' } else { c })
            .collect();
        assert_eq!(name, format!("full_export_{stamp}.json"));
    }
}
