//! Ad copy executor.

use async_trait::async_trait;
use std::sync::Arc;

use super::{prompts, wrong_item, ExecutionOutcome, StageExecutor};
use crate::collaborators::{parse_completion, TextGenerator};
use crate::config::AppConfig;
use crate::core::{AdCopy, Artifact, ArtifactStatus, Payload, StageName, WorkItem};
use crate::errors::StageFailure;

/// Writes one ad variation per item with the text generator.
#[derive(Clone)]
pub struct AdCopyExecutor {
    text: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for AdCopyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdCopyExecutor").finish_non_exhaustive()
    }
}

impl AdCopyExecutor {
    /// Creates the executor.
    #[must_use]
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

#[async_trait]
impl StageExecutor for AdCopyExecutor {
    fn stage(&self) -> StageName {
        StageName::AdCopy
    }

    async fn execute(&self, item: &WorkItem, config: &AppConfig) -> ExecutionOutcome {
        let WorkItem::AdVariant {
            product,
            platform,
            variation,
        } = item
        else {
            return wrong_item(self.stage(), item);
        };

        let request = prompts::ad_copy_request(
            &config.brand,
            product,
            platform,
            config.platforms.platforms.get(platform),
            *variation,
        );
        let content = match self.text.generate(&request).await {
            Ok(content) => content,
            Err(e) => return e.into(),
        };
        let mut ad: AdCopy = match parse_completion(&content) {
            Ok(ad) => ad,
            Err(e) => return e.into(),
        };

        let missing = ad.missing_fields(platform);
        if !missing.is_empty() {
            return StageFailure::malformed(format!(
                "{platform} ad is missing {}",
                missing.join(", ")
            ))
            .into();
        }

        ad.platform = platform.clone();
        ad.variation = *variation;
        ExecutionOutcome::Artifact(Artifact::new(
            item.key(),
            &product.id,
            &product.name,
            ArtifactStatus::Generated,
            Payload::AdCopy(ad),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockTextGenerator;
    use crate::core::Product;
    use crate::errors::{FailureKind, RemoteError};

    fn item(platform: &str) -> WorkItem {
        WorkItem::AdVariant {
            product: Product {
                id: "p1".to_string(),
                name: "Lamp".to_string(),
                ..Default::default()
            },
            platform: platform.to_string(),
            variation: 2,
        }
    }

    fn executor(reply: Result<&'static str, RemoteError>) -> AdCopyExecutor {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(move |_| reply.clone().map(String::from));
        AdCopyExecutor::new(Arc::new(mock))
    }

    fn config() -> AppConfig {
        AppConfig::new("config", "data")
    }

    #[tokio::test]
    async fn test_generates_ad_artifact() {
        let exec = executor(Ok("```json\n{\"headline\": \"Glow up\", \"primary_text\": \"Warm light.\", \"cta\": \"Shop Now\"}\n```"));
        let outcome = exec.execute(&item("meta"), &config()).await;

        let ExecutionOutcome::Artifact(artifact) = outcome else {
            panic!("expected artifact, got {outcome:?}");
        };
        assert_eq!(artifact.id, item("meta").key());
        assert_eq!(artifact.status, ArtifactStatus::Generated);
        let ad = artifact.as_ad_copy().unwrap();
        assert_eq!(ad.platform, "meta");
        assert_eq!(ad.variation, 2);
        assert_eq!(ad.headline.as_deref(), Some("Glow up"));
    }

    #[tokio::test]
    async fn test_missing_required_field_is_malformed() {
        let exec = executor(Ok(r#"{"headline": "Glow up"}"#));
        let outcome = exec.execute(&item("google"), &config()).await;
        let ExecutionOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::MalformedResponse);
        assert!(failure.message.contains("description_line_1"));
    }

    #[tokio::test]
    async fn test_remote_error_is_classified() {
        let exec = executor(Err(RemoteError::status(503, "busy")));
        let outcome = exec.execute(&item("tiktok"), &config()).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failure(StageFailure { kind: FailureKind::TransportError, .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_foreign_item() {
        let exec = AdCopyExecutor::new(Arc::new(MockTextGenerator::new()));
        let foreign = WorkItem::ProductImage {
            product: Product::default(),
        };
        let outcome = exec.execute(&foreign, &config()).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failure(StageFailure { kind: FailureKind::Unexpected, .. })
        ));
    }
}
