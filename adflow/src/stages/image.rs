//! Image enhancement executor.

use async_trait::async_trait;
use std::sync::Arc;

use super::{wrong_item, ExecutionOutcome, StageExecutor};
use crate::collaborators::{BackgroundRemover, BackgroundRequest, SceneGenerator, SceneRequest};
use crate::config::AppConfig;
use crate::core::{Artifact, ArtifactStatus, EnhancedImage, Payload, Product, StageName, WorkItem};
use crate::errors::StageFailure;
use crate::runner::Pacer;

/// Lifestyle scene themes, used in order.
pub const SCENE_THEMES: [&str; 5] = [
    "clean white marble surface with soft natural lighting",
    "modern kitchen countertop with plants in background",
    "minimalist wooden desk with warm ambient light",
    "outdoor garden table with greenery and sunlight",
    "luxury bathroom shelf with candles and towels",
];

/// Removes product backgrounds and renders lifestyle scenes.
///
/// Either service may be absent. Scenes start from the background-removed
/// image when there is one, otherwise from the catalog image. The item
/// fails only when nothing at all was produced.
#[derive(Clone)]
pub struct ImageEnhanceExecutor {
    backgrounds: Option<Arc<dyn BackgroundRemover>>,
    scenes: Option<Arc<dyn SceneGenerator>>,
}

impl std::fmt::Debug for ImageEnhanceExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageEnhanceExecutor")
            .field("backgrounds", &self.backgrounds.is_some())
            .field("scenes", &self.scenes.is_some())
            .finish()
    }
}

impl ImageEnhanceExecutor {
    /// Creates the executor.
    #[must_use]
    pub fn new(backgrounds: Option<Arc<dyn BackgroundRemover>>, scenes: Option<Arc<dyn SceneGenerator>>) -> Self {
        Self { backgrounds, scenes }
    }

    async fn remove_background(&self, product: &Product, image_url: &str) -> Result<Option<String>, StageFailure> {
        let Some(backgrounds) = &self.backgrounds else {
            return Ok(None);
        };
        let request = BackgroundRequest {
            product_id: product.id.clone(),
            image_url: image_url.to_string(),
        };
        let response = backgrounds.remove_background(&request).await?;
        response
            .clean_image_url
            .filter(|u| !u.trim().is_empty())
            .map(Some)
            .ok_or_else(|| StageFailure::malformed("background removal returned no image"))
    }

    async fn generate_scenes(
        &self,
        product: &Product,
        image_url: &str,
        config: &AppConfig,
    ) -> (Vec<String>, Option<StageFailure>) {
        let Some(scenes) = &self.scenes else {
            return (Vec::new(), None);
        };
        let wanted = (config.tools.scenes.scenes_per_product as usize).min(SCENE_THEMES.len());
        let mut pacer = Pacer::new(config.settings.image_enhance.min_interval);
        let mut urls = Vec::with_capacity(wanted);
        let mut last_failure = None;

        for theme in SCENE_THEMES.iter().take(wanted) {
            pacer.wait().await;
            let request = SceneRequest {
                product_id: product.id.clone(),
                image_url: image_url.to_string(),
                theme: (*theme).to_string(),
            };
            let result = scenes.generate_scene(&request).await;
            pacer.mark();

            let failure = match result {
                Ok(response) => match response.scene_url.filter(|u| !u.trim().is_empty()) {
                    Some(url) => {
                        urls.push(url);
                        continue;
                    }
                    None => StageFailure::malformed("scene generation returned no image"),
                },
                Err(e) => StageFailure::from(e),
            };
            tracing::warn!(product = %product.name, theme = *theme, kind = %failure.kind, error = %failure.message, "Scene failed");
            last_failure = Some(failure);
        }
        (urls, last_failure)
    }
}

#[async_trait]
impl StageExecutor for ImageEnhanceExecutor {
    fn stage(&self) -> StageName {
        StageName::ImageEnhance
    }

    async fn execute(&self, item: &WorkItem, config: &AppConfig) -> ExecutionOutcome {
        let WorkItem::ProductImage { product } = item else {
            return wrong_item(self.stage(), item);
        };
        let Some(image_url) = product.image() else {
            return StageFailure::malformed(format!("{} has no image", product.name)).into();
        };

        let (clean_image_url, background_failure) = match self.remove_background(product, image_url).await {
            Ok(clean) => (clean, None),
            Err(failure) => {
                tracing::warn!(product = %product.name, kind = %failure.kind, error = %failure.message, "Background removal failed");
                (None, Some(failure))
            }
        };
        let scene_source = clean_image_url.as_deref().unwrap_or(image_url);
        let (scene_urls, scene_failure) = self.generate_scenes(product, scene_source, config).await;

        if clean_image_url.is_none() && scene_urls.is_empty() {
            return background_failure
                .or(scene_failure)
                .unwrap_or_else(|| StageFailure::unexpected("no image service produced an image"))
                .into();
        }

        ExecutionOutcome::Artifact(Artifact::new(
            item.key(),
            &product.id,
            &product.name,
            ArtifactStatus::Generated,
            Payload::EnhancedImage(EnhancedImage {
                source_url: image_url.to_string(),
                clean_image_url,
                scene_urls,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{BackgroundResponse, SceneResponse};
    use crate::config::PipelineSettings;
    use crate::errors::{FailureKind, RemoteError};
    use crate::testing::{ScriptedBackgroundRemover, ScriptedSceneGenerator};
    use pretty_assertions::assert_eq;

    fn item(image_url: &str) -> WorkItem {
        WorkItem::ProductImage {
            product: Product {
                id: "p1".to_string(),
                name: "Lamp".to_string(),
                image_url: image_url.to_string(),
                ..Default::default()
            },
        }
    }

    fn config(scenes: u32) -> AppConfig {
        let mut config = AppConfig::new("c", "d").with_settings(PipelineSettings::immediate());
        config.tools.scenes.scenes_per_product = scenes;
        config
    }

    fn clean(url: &str) -> Result<BackgroundResponse, RemoteError> {
        Ok(BackgroundResponse {
            clean_image_url: Some(url.to_string()),
        })
    }

    fn enhanced(outcome: ExecutionOutcome) -> EnhancedImage {
        let ExecutionOutcome::Artifact(artifact) = outcome else {
            panic!("expected artifact");
        };
        artifact.as_enhanced_image().unwrap().clone()
    }

    #[tokio::test]
    async fn test_scenes_start_from_clean_image() {
        let backgrounds = Arc::new(ScriptedBackgroundRemover::new(clean("https://cdn.example.com/clean.png")));
        let scenes = Arc::new(ScriptedSceneGenerator::numbered());
        let exec = ImageEnhanceExecutor::new(Some(backgrounds.clone()), Some(scenes.clone()));

        let image = enhanced(exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(2)).await);
        assert_eq!(image.source_url, "https://shop.example.com/lamp.jpg");
        assert_eq!(image.clean_image_url.as_deref(), Some("https://cdn.example.com/clean.png"));
        assert_eq!(image.scene_urls.len(), 2);

        let requests = scenes.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.image_url == "https://cdn.example.com/clean.png"));
        assert_eq!(requests[1].theme, SCENE_THEMES[1]);
        assert_eq!(backgrounds.calls(), 1);
    }

    #[tokio::test]
    async fn test_scenes_capped_by_themes() {
        let scenes = Arc::new(ScriptedSceneGenerator::numbered());
        let exec = ImageEnhanceExecutor::new(None, Some(scenes.clone()));
        let image = enhanced(exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(9)).await);
        assert_eq!(image.scene_urls.len(), SCENE_THEMES.len());
    }

    #[tokio::test]
    async fn test_backgrounds_disabled_uses_catalog_image() {
        let scenes = Arc::new(ScriptedSceneGenerator::numbered());
        let exec = ImageEnhanceExecutor::new(None, Some(scenes.clone()));

        let image = enhanced(exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(1)).await);
        assert_eq!(image.clean_image_url, None);
        assert_eq!(image.scene_urls, vec!["https://cdn.example.com/scene-1.png"]);
        assert_eq!(scenes.requests()[0].image_url, "https://shop.example.com/lamp.jpg");
    }

    #[tokio::test]
    async fn test_scenes_disabled_keeps_clean_image() {
        let backgrounds = Arc::new(ScriptedBackgroundRemover::new(clean("https://cdn.example.com/clean.png")));
        let exec = ImageEnhanceExecutor::new(Some(backgrounds), None);

        let image = enhanced(exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(3)).await);
        assert_eq!(image.clean_image_url.as_deref(), Some("https://cdn.example.com/clean.png"));
        assert!(image.scene_urls.is_empty());
    }

    #[tokio::test]
    async fn test_failed_scenes_keep_clean_image() {
        let backgrounds = Arc::new(ScriptedBackgroundRemover::new(clean("https://cdn.example.com/clean.png")));
        let scenes = Arc::new(ScriptedSceneGenerator::new(Err(RemoteError::status(503, "busy"))));
        let exec = ImageEnhanceExecutor::new(Some(backgrounds), Some(scenes.clone()));

        let image = enhanced(exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(2)).await);
        assert_eq!(image.clean_image_url.as_deref(), Some("https://cdn.example.com/clean.png"));
        assert!(image.scene_urls.is_empty());
        assert_eq!(scenes.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_background_still_renders_scenes() {
        let backgrounds = Arc::new(ScriptedBackgroundRemover::new(Err(RemoteError::Transport("reset".into()))));
        let scenes = Arc::new(ScriptedSceneGenerator::numbered());
        let exec = ImageEnhanceExecutor::new(Some(backgrounds), Some(scenes.clone()));

        let image = enhanced(exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(1)).await);
        assert_eq!(image.clean_image_url, None);
        assert_eq!(image.scene_urls.len(), 1);
        assert_eq!(scenes.requests()[0].image_url, "https://shop.example.com/lamp.jpg");
    }

    #[tokio::test]
    async fn test_nothing_produced_is_a_failure() {
        let backgrounds = Arc::new(ScriptedBackgroundRemover::new(Err(RemoteError::Transport("reset".into()))));
        let scenes = Arc::new(ScriptedSceneGenerator::new(Ok(SceneResponse::default())));
        let exec = ImageEnhanceExecutor::new(Some(backgrounds), Some(scenes));

        let outcome = exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(1)).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failure(StageFailure { kind: FailureKind::TransportError, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_image_makes_no_call() {
        let backgrounds = Arc::new(ScriptedBackgroundRemover::new(clean("https://cdn.example.com/clean.png")));
        let exec = ImageEnhanceExecutor::new(Some(backgrounds.clone()), None);
        let outcome = exec.execute(&item(""), &config(1)).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failure(StageFailure { kind: FailureKind::MalformedResponse, .. })
        ));
        assert_eq!(backgrounds.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_background_response_is_malformed() {
        let exec = ImageEnhanceExecutor::new(
            Some(Arc::new(ScriptedBackgroundRemover::new(Ok(BackgroundResponse::default())))),
            None,
        );
        let outcome = exec.execute(&item("https://shop.example.com/lamp.jpg"), &config(1)).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failure(StageFailure { kind: FailureKind::MalformedResponse, .. })
        ));
    }
}
