//! Persisted artifacts and their stage-specific payloads.

use serde::{Deserialize, Serialize};

use super::ContentKey;

/// Lifecycle tag stored with every artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Produced synchronously by a text or image collaborator.
    Generated,
    /// Produced by a finished remote job.
    Completed,
    /// Recorded as failed (kept only when a caller chooses to persist failures).
    Failed,
}

/// A generated result for exactly one [`ContentKey`].
///
/// Artifacts are immutable once written; stores merge them by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// The content key of the source work item.
    pub id: ContentKey,
    /// Owning product.
    pub product_id: String,
    /// Product name at generation time, for exports.
    #[serde(default)]
    pub product_name: String,
    /// Lifecycle tag.
    pub status: ArtifactStatus,
    /// When the artifact was created (ISO 8601).
    pub created_at: String,
    /// Stage-specific fields.
    pub payload: Payload,
}

impl Artifact {
    /// Creates a new artifact stamped with the current time.
    #[must_use]
    pub fn new(
        id: ContentKey,
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        status: ArtifactStatus,
        payload: Payload,
    ) -> Self {
        Self {
            id,
            product_id: product_id.into(),
            product_name: product_name.into(),
            status,
            created_at: crate::utils::iso_timestamp(),
            payload,
        }
    }

    /// Returns the ad copy payload, if this is an ad copy artifact.
    #[must_use]
    pub fn as_ad_copy(&self) -> Option<&AdCopy> {
        match &self.payload {
            Payload::AdCopy(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the UGC script payload, if this is a script artifact.
    #[must_use]
    pub fn as_ugc_script(&self) -> Option<&UgcScript> {
        match &self.payload {
            Payload::UgcScript(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the enhanced image payload, if this is an image artifact.
    #[must_use]
    pub fn as_enhanced_image(&self) -> Option<&EnhancedImage> {
        match &self.payload {
            Payload::EnhancedImage(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the video payload, if this is a video artifact.
    #[must_use]
    pub fn as_ugc_video(&self) -> Option<&UgcVideo> {
        match &self.payload {
            Payload::UgcVideo(p) => Some(p),
            _ => None,
        }
    }
}

/// Stage-specific artifact content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Output of the image-enhance stage.
    EnhancedImage(EnhancedImage),
    /// Output of the ad-copy stage.
    AdCopy(AdCopy),
    /// Output of the UGC-script stage.
    UgcScript(UgcScript),
    /// Output of the UGC-video stage.
    UgcVideo(UgcVideo),
}

/// References to an enhanced product image and its generated scenes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnhancedImage {
    /// Image the enhancer started from.
    pub source_url: String,
    /// Background-removed image, when backgrounds were removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_image_url: Option<String>,
    /// Lifestyle scene renders.
    #[serde(default)]
    pub scene_urls: Vec<String>,
}

/// One ad variation for one platform.
///
/// Field presence depends on the platform; see
/// [`AdCopy::missing_fields`] for the per-platform requirements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdCopy {
    /// Target platform (meta, google, tiktok, pinterest, ...).
    #[serde(default)]
    pub platform: String,
    /// 1-based variation number.
    #[serde(default)]
    pub variation: u32,
    /// Headline (meta, google).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    /// Primary text (meta).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_text: Option<String>,
    /// Description (meta, pinterest).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// First description line (google).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_line_1: Option<String>,
    /// Second description line (google).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_line_2: Option<String>,
    /// Ad text (tiktok).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_text: Option<String>,
    /// Caption (tiktok).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Title (pinterest).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Call to action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,
}

impl AdCopy {
    /// Fields a platform requires to be present and non-blank.
    #[must_use]
    pub fn required_fields(platform: &str) -> &'static [&'static str] {
        match platform {
            "meta" => &["headline", "primary_text"],
            "google" => &["headline", "description_line_1"],
            "tiktok" => &["ad_text"],
            "pinterest" => &["title", "description"],
            _ => &[],
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "headline" => self.headline.as_deref(),
            "primary_text" => self.primary_text.as_deref(),
            "description" => self.description.as_deref(),
            "description_line_1" => self.description_line_1.as_deref(),
            "description_line_2" => self.description_line_2.as_deref(),
            "ad_text" => self.ad_text.as_deref(),
            "caption" => self.caption.as_deref(),
            "title" => self.title.as_deref(),
            "cta" => self.cta.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Returns the required fields that are missing or blank.
    ///
    /// Platforms without explicit requirements need at least one text field.
    #[must_use]
    pub fn missing_fields(&self, platform: &str) -> Vec<&'static str> {
        let required = Self::required_fields(platform);
        if required.is_empty() {
            let any = [
                "headline",
                "primary_text",
                "description",
                "description_line_1",
                "ad_text",
                "title",
            ]
            .iter()
            .any(|f| self.field(f).is_some());
            return if any { Vec::new() } else { vec!["any text field"] };
        }
        required
            .iter()
            .copied()
            .filter(|f| self.field(f).is_none())
            .collect()
    }
}

/// One scene of a UGC script.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Spoken line.
    #[serde(default)]
    pub dialogue: String,
    /// Shot description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<String>,
    /// Scene length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

/// A UGC video script for one product and one UGC angle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UgcScript {
    /// The UGC angle (review, unboxing, ...).
    #[serde(default)]
    pub ugc_type: String,
    /// Opening line.
    pub hook: String,
    /// Ordered scenes.
    pub scenes: Vec<Scene>,
    /// Closing call to action.
    pub cta: String,
    /// Estimated runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<f64>,
    /// Suggested background music.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_suggestion: Option<String>,
}

impl UgcScript {
    /// Flattens the script into the plain text sent to the video renderer.
    #[must_use]
    pub fn spoken_text(&self) -> String {
        std::iter::once(self.hook.as_str())
            .chain(self.scenes.iter().map(|s| s.dialogue.as_str()))
            .chain(std::iter::once(self.cta.as_str()))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A finished remote video render.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UgcVideo {
    /// Content key of the script the video was rendered from.
    pub script_id: ContentKey,
    /// UGC angle of the source script.
    #[serde(default)]
    pub ugc_type: String,
    /// Job id assigned by the renderer.
    pub remote_job_id: String,
    /// Where the rendered file lives.
    pub video_url: String,
    /// Runtime reported by the renderer, or the script estimate.
    #[serde(default)]
    pub duration_seconds: f64,
}
