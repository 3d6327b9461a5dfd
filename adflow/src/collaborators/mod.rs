//! Remote and local services the stage executors talk to.
//!
//! Each service is a narrow `async_trait` seam so runs can be driven by
//! scripted doubles in tests. The reqwest-backed clients are compiled with
//! the `http` feature.

mod catalog;
mod export;
#[cfg(feature = "http")]
pub(crate) mod http;
mod image;
mod text;
mod video;

pub use catalog::{CatalogSource, FeedRecord, FeedSource};
pub use export::{exporter_for, Exporter, JsonExporter};
pub use image::{
    BackgroundRemover, BackgroundRequest, BackgroundResponse, SceneGenerator, SceneRequest,
    SceneResponse,
};
pub use text::{parse_completion, strip_code_fences, TextGenerator, TextRequest};
pub use video::{
    RenderRequest, RenderStatus, SubmitResponse, VideoRenderer, COMPLETED_STATUSES,
    FAILED_STATUSES,
};

#[cfg(test)]
pub use text::MockTextGenerator;

#[cfg(feature = "http")]
pub use image::{RemoteBackgroundRemover, RemoteSceneGenerator};
#[cfg(feature = "http")]
pub use text::OpenRouterClient;
#[cfg(feature = "http")]
pub use video::CreatifyClient;

use std::sync::Arc;

/// The services available to one run. Stages whose service is missing are skipped.
#[derive(Clone)]
pub struct Collaborators {
    /// Product feed.
    pub catalog: Option<Arc<dyn CatalogSource>>,
    /// Background removal.
    pub backgrounds: Option<Arc<dyn BackgroundRemover>>,
    /// Lifestyle scene generation.
    pub scenes: Option<Arc<dyn SceneGenerator>>,
    /// Text generation.
    pub text: Option<Arc<dyn TextGenerator>>,
    /// Video rendering.
    pub video: Option<Arc<dyn VideoRenderer>>,
    /// Final export.
    pub exporter: Option<Arc<dyn Exporter>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("catalog", &self.catalog.as_ref().map(|c| c.describe()))
            .field("backgrounds", &self.backgrounds.is_some())
            .field("scenes", &self.scenes.is_some())
            .field("text", &self.text.is_some())
            .field("video", &self.video.is_some())
            .field("exporter", &self.exporter.is_some())
            .finish()
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::new()
    }
}

impl Collaborators {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: None,
            backgrounds: None,
            scenes: None,
            text: None,
            video: None,
            exporter: None,
        }
    }

    /// Sets the product feed.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the background remover.
    #[must_use]
    pub fn with_backgrounds(mut self, backgrounds: Arc<dyn BackgroundRemover>) -> Self {
        self.backgrounds = Some(backgrounds);
        self
    }

    /// Sets the scene generator.
    #[must_use]
    pub fn with_scenes(mut self, scenes: Arc<dyn SceneGenerator>) -> Self {
        self.scenes = Some(scenes);
        self
    }

    /// Sets the text generator.
    #[must_use]
    pub fn with_text(mut self, text: Arc<dyn TextGenerator>) -> Self {
        self.text = Some(text);
        self
    }

    /// Sets the video renderer.
    #[must_use]
    pub fn with_video(mut self, video: Arc<dyn VideoRenderer>) -> Self {
        self.video = Some(video);
        self
    }

    /// Sets the exporter.
    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Builds the HTTP clients a configuration enables.
    ///
    /// A service is configured only when it is enabled and its key is set.
    #[cfg(feature = "http")]
    pub fn from_config(config: &crate::config::AppConfig) -> Result<Self, crate::errors::FlowError> {
        let settings = &config.settings;
        let mut collaborators = Self::new().with_exporter(Arc::new(exporter_for(
            &config.platforms.output_format,
            config.data_dir.join("exports"),
        )));

        if let Some(feed) = config.feed.as_deref() {
            collaborators = collaborators.with_catalog(Arc::new(FeedSource::parse(feed)));
        }

        if let Some(key) = &config.keys.text {
            let client = OpenRouterClient::new(
                key.clone(),
                config.tools.text.clone(),
                settings.ad_copy.call_timeout.max(settings.ugc_script.call_timeout),
            )?;
            collaborators = collaborators.with_text(Arc::new(client));
        }

        let backgrounds = &config.tools.backgrounds;
        if let (true, Some(endpoint), Some(key)) =
            (backgrounds.enabled, backgrounds.endpoint.as_deref(), &config.keys.backgrounds)
        {
            let client = RemoteBackgroundRemover::new(endpoint, key.clone(), settings.image_enhance.call_timeout)?;
            collaborators = collaborators.with_backgrounds(Arc::new(client));
        }

        let scenes = &config.tools.scenes;
        if let (true, Some(endpoint), Some(key)) = (scenes.enabled, scenes.endpoint.as_deref(), &config.keys.scenes) {
            let client = RemoteSceneGenerator::new(endpoint, key.clone(), settings.image_enhance.call_timeout)?;
            collaborators = collaborators.with_scenes(Arc::new(client));
        }

        if let (true, Some(key)) = (config.tools.video.enabled, &config.keys.video) {
            let client = CreatifyClient::new(
                config.tools.video.api_base.clone(),
                key.clone(),
                settings.ugc_video.call_timeout,
                settings.poll.request_timeout,
            )?;
            collaborators = collaborators.with_video(Arc::new(client));
        }

        tracing::debug!(collaborators = ?collaborators, "Collaborators configured");
        Ok(collaborators)
    }
}
