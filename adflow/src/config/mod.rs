//! Run configuration.
//!
//! Everything a run needs is gathered once into an [`AppConfig`] and passed
//! down explicitly; nothing is read from process-wide state afterwards.

mod files;
mod settings;

pub use files::{
    BackgroundToolConfig, BrandConfig, PlatformConfig, PlatformsConfig, SceneToolConfig,
    TextToolConfig, ToolsConfig, VideoToolConfig,
};
pub use settings::{
    PipelineSettings, PollSettings, RunFilters, RunFlags, StageSettings, DEFAULT_FLUSH_EVERY,
};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Environment variable holding the text generation key.
pub const TEXT_API_KEY_VAR: &str = "OPENROUTER_API_KEY";
/// Environment variable holding the video rendering key.
pub const VIDEO_API_KEY_VAR: &str = "CREATIFY_API_KEY";
/// Environment variable holding the background removal key.
pub const BACKGROUND_API_KEY_VAR: &str = "PHOTOROOM_API_KEY";
/// Environment variable holding the scene generation key.
pub const SCENE_API_KEY_VAR: &str = "PEBBLELY_API_KEY";

/// Secrets for the remote collaborators.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    /// Text generation.
    pub text: Option<String>,
    /// Video rendering.
    pub video: Option<String>,
    /// Background removal.
    pub backgrounds: Option<String>,
    /// Lifestyle scene generation.
    pub scenes: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("text", &mask(&self.text))
            .field("video", &mask(&self.video))
            .field("backgrounds", &mask(&self.backgrounds))
            .field("scenes", &mask(&self.scenes))
            .finish()
    }
}

impl ApiKeys {
    /// Reads keys from the process environment. Blank values count as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let read = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        Self {
            text: read(TEXT_API_KEY_VAR),
            video: read(VIDEO_API_KEY_VAR),
            backgrounds: read(BACKGROUND_API_KEY_VAR),
            scenes: read(SCENE_API_KEY_VAR),
        }
    }
}

/// Complete configuration of one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `brand.json`, `platforms.json` and `tools.json`.
    pub config_dir: PathBuf,
    /// Directory holding the stores and exports.
    pub data_dir: PathBuf,
    /// Product feed: a JSON file path or an http(s) URL.
    pub feed: Option<String>,
    /// Brand voice.
    pub brand: BrandConfig,
    /// Platforms and UGC angles.
    pub platforms: PlatformsConfig,
    /// Remote collaborators.
    pub tools: ToolsConfig,
    /// Secrets.
    pub keys: ApiKeys,
    /// Pacing and deadlines.
    pub settings: PipelineSettings,
    /// Stage selection.
    pub flags: RunFlags,
    /// Work item filters.
    pub filters: RunFilters,
}

impl AppConfig {
    /// Creates a configuration with defaults for every file.
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
            feed: None,
            brand: BrandConfig::default(),
            platforms: PlatformsConfig::default(),
            tools: ToolsConfig::default(),
            keys: ApiKeys::default(),
            settings: PipelineSettings::default(),
            flags: RunFlags::default(),
            filters: RunFilters::default(),
        }
    }

    /// Loads the config files from `config_dir` and keys from the environment.
    ///
    /// Missing files fall back to defaults; unreadable or invalid files are
    /// errors.
    pub fn load(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::new(config_dir, data_dir);
        config.brand = load_json_file(&config.config_dir.join("brand.json"))?;
        config.platforms = load_json_file(&config.config_dir.join("platforms.json"))?;
        config.tools = load_json_file(&config.config_dir.join("tools.json"))?;
        config.keys = ApiKeys::from_env();

        tracing::debug!(
            config_dir = %config.config_dir.display(),
            platforms = config.platforms.platforms.len(),
            keys = ?config.keys,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Sets the product feed.
    #[must_use]
    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = Some(feed.into());
        self
    }

    /// Sets the run flags.
    #[must_use]
    pub fn with_flags(mut self, flags: RunFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the work item filters.
    #[must_use]
    pub fn with_filters(mut self, filters: RunFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the pacing settings.
    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the platform configuration.
    #[must_use]
    pub fn with_platforms(mut self, platforms: PlatformsConfig) -> Self {
        self.platforms = platforms;
        self
    }
}

fn load_json_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
