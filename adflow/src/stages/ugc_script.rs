//! UGC script executor.

use async_trait::async_trait;
use std::sync::Arc;

use super::{prompts, wrong_item, ExecutionOutcome, StageExecutor};
use crate::collaborators::{parse_completion, TextGenerator};
use crate::config::AppConfig;
use crate::core::{Artifact, ArtifactStatus, Payload, StageName, UgcScript, WorkItem};
use crate::errors::StageFailure;

/// Writes one UGC script per item with the text generator.
#[derive(Clone)]
pub struct UgcScriptExecutor {
    text: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for UgcScriptExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UgcScriptExecutor").finish_non_exhaustive()
    }
}

impl UgcScriptExecutor {
    /// Creates the executor.
    #[must_use]
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

fn validate(script: &UgcScript) -> Result<(), StageFailure> {
    let mut missing = Vec::new();
    if script.hook.trim().is_empty() {
        missing.push("hook");
    }
    if script.scenes.is_empty() {
        missing.push("scenes");
    }
    if script.cta.trim().is_empty() {
        missing.push("cta");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StageFailure::malformed(format!("script is missing {}", missing.join(", "))))
    }
}

#[async_trait]
impl StageExecutor for UgcScriptExecutor {
    fn stage(&self) -> StageName {
        StageName::UgcScript
    }

    async fn execute(&self, item: &WorkItem, config: &AppConfig) -> ExecutionOutcome {
        let WorkItem::UgcScript { product, ugc_type } = item else {
            return wrong_item(self.stage(), item);
        };

        let request = prompts::ugc_script_request(&config.brand, product, ugc_type);
        let content = match self.text.generate(&request).await {
            Ok(content) => content,
            Err(e) => return e.into(),
        };
        let mut script: UgcScript = match parse_completion(&content) {
            Ok(script) => script,
            Err(e) => return e.into(),
        };
        if let Err(failure) = validate(&script) {
            return failure.into();
        }

        script.ugc_type = ugc_type.clone();
        ExecutionOutcome::Artifact(Artifact::new(
            item.key(),
            &product.id,
            &product.name,
            ArtifactStatus::Generated,
            Payload::UgcScript(script),
        ))
    }
}
