//! Schemas of the JSON files under the config directory.
//!
//! Every field has a serde default so a missing file or a partial file
//! still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `brand.json`: voice and positioning used in every prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    /// Brand name as it appears in copy.
    #[serde(default = "default_business_name")]
    pub business_name: String,
    /// One of the tone presets (friendly-professional, casual-bold, ...).
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Unique selling proposition.
    #[serde(default)]
    pub usp: String,
    /// Who the ads speak to.
    #[serde(default)]
    pub target_audience: String,
    /// Brands to differentiate from.
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Words the copy must never contain.
    #[serde(default)]
    pub words_to_avoid: Vec<String>,
}

fn default_business_name() -> String {
    "the brand".to_string()
}

fn default_tone() -> String {
    "friendly-professional".to_string()
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            business_name: default_business_name(),
            tone: default_tone(),
            usp: String::new(),
            target_audience: String::new(),
            competitors: Vec::new(),
            words_to_avoid: Vec::new(),
        }
    }
}

impl BrandConfig {
    /// Describes the configured tone for a prompt.
    #[must_use]
    pub fn tone_description(&self) -> &'static str {
        match self.tone.as_str() {
            "casual-bold" => "Playful, punchy, internet-native. High energy.",
            "luxury-minimal" => "Understated elegance. Less is more. Sophisticated word choice.",
            "technical-authority" => "Data-driven and expert. Lead with specs, results, and proof.",
            _ => "Warm and approachable but credible. Conversational yet trustworthy.",
        }
    }
}

/// Settings of one ad platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Whether ads are generated for this platform.
    #[serde(default)]
    pub enabled: bool,
    /// Number of variations per product.
    #[serde(default = "default_variations")]
    pub variations_per_product: u32,
    /// Maximum characters per ad field.
    #[serde(default)]
    pub char_limits: BTreeMap<String, u32>,
}

fn default_variations() -> u32 {
    4
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            variations_per_product: default_variations(),
            char_limits: BTreeMap::new(),
        }
    }
}

/// `platforms.json`: ad platforms, UGC angles and export format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsConfig {
    /// Platform settings keyed by platform name.
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformConfig>,
    /// UGC script angles.
    #[serde(default = "default_ugc_types")]
    pub ugc_types: Vec<String>,
    /// Export format name.
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_ugc_types() -> Vec<String> {
    ["review", "unboxing", "problem-solution"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_output_format() -> String {
    "json".to_string()
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            platforms: BTreeMap::new(),
            ugc_types: default_ugc_types(),
            output_format: default_output_format(),
        }
    }
}

impl PlatformsConfig {
    /// Enabled platforms in name order, narrowed to `only` when given.
    #[must_use]
    pub fn enabled_platforms(&self, only: Option<&str>) -> Vec<(&str, &PlatformConfig)> {
        self.platforms
            .iter()
            .filter(|(name, cfg)| cfg.enabled && only.map_or(true, |o| o == name.as_str()))
            .map(|(name, cfg)| (name.as_str(), cfg))
            .collect()
    }

    /// UGC angles, narrowed to `only` when given.
    #[must_use]
    pub fn ugc_types(&self, only: Option<&str>) -> Vec<&str> {
        self.ugc_types
            .iter()
            .map(String::as_str)
            .filter(|t| only.map_or(true, |o| o == *t))
            .collect()
    }

    /// Adds or replaces a platform.
    #[must_use]
    pub fn with_platform(mut self, name: impl Into<String>, config: PlatformConfig) -> Self {
        self.platforms.insert(name.into(), config);
        self
    }
}

/// Text generation settings (`ad_copy` in `tools.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToolConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Chat completions endpoint.
    #[serde(default = "default_text_endpoint")]
    pub endpoint: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Response token limit.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "deepseek/deepseek-chat".to_string()
}

fn default_text_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for TextToolConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_text_endpoint(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Background removal settings (`image_enhancement` in `tools.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackgroundToolConfig {
    /// Whether backgrounds are removed.
    #[serde(default)]
    pub enabled: bool,
    /// Background removal endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Lifestyle scene settings (`lifestyle_scenes` in `tools.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneToolConfig {
    /// Whether lifestyle scenes are generated.
    #[serde(default)]
    pub enabled: bool,
    /// Scene generation endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Scenes rendered per product, capped by the number of themes.
    #[serde(default = "default_scenes_per_product")]
    pub scenes_per_product: u32,
}

fn default_scenes_per_product() -> u32 {
    3
}

impl Default for SceneToolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            scenes_per_product: default_scenes_per_product(),
        }
    }
}

/// Video rendering settings (`ugc_video` in `tools.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoToolConfig {
    /// Whether the stage may run.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the rendering API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Avatar to render with; the service picks one when empty.
    #[serde(default)]
    pub avatar_id: String,
}

fn default_api_base() -> String {
    "https://api.creatify.ai/api".to_string()
}

impl Default for VideoToolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: default_api_base(),
            avatar_id: String::new(),
        }
    }
}

/// `tools.json`: remote collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Text generation for ad copy and scripts.
    #[serde(default, rename = "ad_copy")]
    pub text: TextToolConfig,
    /// Background removal.
    #[serde(default, rename = "image_enhancement")]
    pub backgrounds: BackgroundToolConfig,
    /// Lifestyle scene generation.
    #[serde(default, rename = "lifestyle_scenes")]
    pub scenes: SceneToolConfig,
    /// Video rendering.
    #[serde(default, rename = "ugc_video")]
    pub video: VideoToolConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_platforms_defaults() {
        let cfg: PlatformsConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.platforms.is_empty());
        assert_eq!(cfg.ugc_types, vec!["review", "unboxing", "problem-solution"]);
        assert_eq!(cfg.output_format, "json");
    }

    #[test]
    fn test_enabled_platforms_filter() {
        let cfg: PlatformsConfig = serde_json::from_str(
            r#"{
                "platforms": {
                    "meta": {"enabled": true, "variations_per_product": 2},
                    "google": {"enabled": true},
                    "tiktok": {"enabled": false}
                }
            }"#,
        )
        .unwrap();

        let names: Vec<_> = cfg.enabled_platforms(None).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["google", "meta"]);

        let only = cfg.enabled_platforms(Some("meta"));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].1.variations_per_product, 2);

        assert!(cfg.enabled_platforms(Some("tiktok")).is_empty());
        assert_eq!(cfg.platforms["google"].variations_per_product, 4);
    }

    #[test]
    fn test_ugc_type_filter() {
        let cfg = PlatformsConfig::default();
        assert_eq!(cfg.ugc_types(Some("unboxing")), vec!["unboxing"]);
        assert!(cfg.ugc_types(Some("haul")).is_empty());
        assert_eq!(cfg.ugc_types(None).len(), 3);
    }

    #[test]
    fn test_tools_sections() {
        let cfg: ToolsConfig = serde_json::from_str(
            r#"{"ad_copy": {"model": "m"}, "ugc_video": {"enabled": true, "avatar_id": "a1"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.text.model, "m");
        assert_eq!(cfg.text.endpoint, default_text_endpoint());
        assert!(cfg.video.enabled);
        assert_eq!(cfg.video.api_base, "https://api.creatify.ai/api");
        assert!(!cfg.backgrounds.enabled);
        assert!(!cfg.scenes.enabled);
        assert_eq!(cfg.scenes.scenes_per_product, 3);
    }

    #[test]
    fn test_image_sections_are_independent() {
        let cfg: ToolsConfig = serde_json::from_str(
            r#"{
                "image_enhancement": {"enabled": false, "endpoint": "https://bg.example.com/segment"},
                "lifestyle_scenes": {"enabled": true, "scenes_per_product": 2}
            }"#,
        )
        .unwrap();
        assert!(!cfg.backgrounds.enabled);
        assert_eq!(cfg.backgrounds.endpoint.as_deref(), Some("https://bg.example.com/segment"));
        assert!(cfg.scenes.enabled);
        assert_eq!(cfg.scenes.scenes_per_product, 2);
        assert_eq!(cfg.scenes.endpoint, None);
    }

    #[test]
    fn test_brand_tone() {
        let brand = BrandConfig {
            tone: "luxury-minimal".to_string(),
            ..Default::default()
        };
        assert!(brand.tone_description().starts_with("Understated"));
        assert!(BrandConfig::default().tone_description().starts_with("Warm"));
    }
}
