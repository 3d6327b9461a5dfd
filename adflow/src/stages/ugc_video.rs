//! UGC video executor: submits renders and converts finished jobs.

use async_trait::async_trait;
use std::sync::Arc;

use super::{wrong_item, ExecutionOutcome, JobHandle, JobTracker, StageExecutor};
use crate::collaborators::{RenderRequest, RenderStatus, VideoRenderer};
use crate::config::AppConfig;
use crate::core::{Artifact, ArtifactStatus, Payload, StageName, UgcScript, UgcVideo, WorkItem};
use crate::errors::{RemoteError, StageFailure};
use crate::runner::StageTally;
use crate::store::StoreIndex;

/// Submits one render per stored script and follows it to completion.
#[derive(Clone)]
pub struct UgcVideoExecutor {
    video: Arc<dyn VideoRenderer>,
}

impl std::fmt::Debug for UgcVideoExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UgcVideoExecutor").finish_non_exhaustive()
    }
}

impl UgcVideoExecutor {
    /// Creates the executor.
    #[must_use]
    pub fn new(video: Arc<dyn VideoRenderer>) -> Self {
        Self { video }
    }
}

#[async_trait]
impl StageExecutor for UgcVideoExecutor {
    fn stage(&self) -> StageName {
        StageName::UgcVideo
    }

    async fn execute(&self, item: &WorkItem, config: &AppConfig) -> ExecutionOutcome {
        let WorkItem::UgcVideo { script, image_url } = item else {
            return wrong_item(self.stage(), item);
        };
        let Some(payload) = script.as_ugc_script() else {
            return StageFailure::malformed(format!("{} is not a UGC script", script.id)).into();
        };
        let text = payload.spoken_text();
        if text.is_empty() {
            return StageFailure::malformed(format!("script {} has no spoken text", script.id)).into();
        }

        let avatar = config.tools.video.avatar_id.trim();
        let request = RenderRequest {
            script: text,
            avatar_id: (!avatar.is_empty()).then(|| avatar.to_string()),
            image_url: image_url.clone(),
            visual_style: "ugc",
        };
        match self.video.submit(&request).await {
            Ok(reply) => match reply.id.filter(|id| !id.trim().is_empty()) {
                Some(job_id) => ExecutionOutcome::AsyncHandle(JobHandle::new(job_id, item.clone())),
                None => StageFailure::malformed("render submission returned no job id").into(),
            },
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl JobTracker for UgcVideoExecutor {
    async fn poll(&self, handle: &JobHandle) -> Result<RenderStatus, RemoteError> {
        self.video.status(&handle.job_id).await
    }

    fn into_artifact(&self, handle: &JobHandle, status: &RenderStatus) -> Result<Artifact, StageFailure> {
        let WorkItem::UgcVideo { script, .. } = &handle.item else {
            return Err(StageFailure::unexpected("job handle does not belong to a video item"));
        };
        let video_url = status
            .resolved_url()
            .ok_or_else(|| StageFailure::malformed(format!("job {} completed without a video URL", handle.job_id)))?;
        let script_payload = script.as_ugc_script();
        let duration_seconds = status
            .duration
            .or_else(|| script_payload.and_then(|s| s.total_duration_seconds))
            .unwrap_or_default();

        Ok(Artifact::new(
            handle.item.key(),
            &script.product_id,
            &script.product_name,
            ArtifactStatus::Completed,
            Payload::UgcVideo(UgcVideo {
                script_id: script.id.clone(),
                ugc_type: script_payload.map(|s| s.ugc_type.clone()).unwrap_or_default(),
                remote_job_id: handle.job_id.clone(),
                video_url: video_url.to_string(),
                duration_seconds,
            }),
        ))
    }
}

/// Logs the renders a run would submit, without calling the renderer.
///
/// Items already in `existing` count as skipped and scripts without spoken
/// text as failed, as they would in a real run. Nothing is stored.
#[must_use]
pub fn preview_video_renders(items: &[WorkItem], existing: &StoreIndex) -> StageTally {
    let mut tally = StageTally::default();
    for item in items {
        let WorkItem::UgcVideo { script, image_url } = item else {
            continue;
        };
        if existing.contains(&item.key()) {
            tally.skipped += 1;
            continue;
        }
        let text = script.as_ugc_script().map(UgcScript::spoken_text).unwrap_or_default();
        if text.is_empty() {
            tracing::warn!(item = %item.label(), kind = "malformed_response", "Script has no spoken text");
            tally.failed += 1;
            continue;
        }
        tracing::info!(
            item = %item.label(),
            script_chars = text.chars().count(),
            image = image_url.as_deref().unwrap_or("(none)"),
            "Dry run: would render video"
        );
        tally.generated += 1;
    }
    tracing::info!(would_render = tally.generated, skipped = tally.skipped, failed = tally.failed, "Dry run finished");
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContentKey, Scene};
    use crate::errors::FailureKind;
    use crate::testing::ScriptedRenderer;

    fn script_artifact(hook: &str) -> Artifact {
        Artifact::new(
            ContentKey::derive(&["p1", "review"]),
            "p1",
            "Lamp",
            ArtifactStatus::Generated,
            Payload::UgcScript(UgcScript {
                ugc_type: "review".to_string(),
                hook: hook.to_string(),
                scenes: vec![Scene {
                    dialogue: "It glows.".to_string(),
                    ..Default::default()
                }],
                cta: "Get it.".to_string(),
                total_duration_seconds: Some(24.0),
                music_suggestion: None,
            }),
        )
    }

    fn item(script: Artifact) -> WorkItem {
        WorkItem::UgcVideo {
            script,
            image_url: Some("https://cdn.example.com/clean.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_returns_handle() {
        let renderer = Arc::new(ScriptedRenderer::new().with_job_id("job-1"));
        let exec = UgcVideoExecutor::new(renderer.clone());
        let video_item = item(script_artifact("Hi."));

        let outcome = exec.execute(&video_item, &AppConfig::new("c", "d")).await;
        let ExecutionOutcome::AsyncHandle(handle) = outcome else {
            panic!("expected handle");
        };
        assert_eq!(handle.job_id, "job-1");
        assert_eq!(handle.attempts, 0);

        let submitted = renderer.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].script, "Hi. It glows. Get it.");
        assert_eq!(submitted[0].avatar_id, None);
    }

    #[tokio::test]
    async fn test_missing_job_id_is_malformed() {
        let exec = UgcVideoExecutor::new(Arc::new(ScriptedRenderer::new()));
        let outcome = exec.execute(&item(script_artifact("Hi.")), &AppConfig::new("c", "d")).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failure(StageFailure { kind: FailureKind::MalformedResponse, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_script_makes_no_call() {
        let renderer = Arc::new(ScriptedRenderer::new().with_job_id("job-1"));
        let exec = UgcVideoExecutor::new(renderer.clone());
        let mut empty = script_artifact("");
        if let Payload::UgcScript(s) = &mut empty.payload {
            s.scenes.clear();
            s.cta.clear();
        }
        let outcome = exec.execute(&item(empty), &AppConfig::new("c", "d")).await;
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failure(StageFailure { kind: FailureKind::MalformedResponse, .. })
        ));
        assert!(renderer.submitted().is_empty());
    }

    #[test]
    fn test_into_artifact_fallbacks() {
        let exec = UgcVideoExecutor::new(Arc::new(ScriptedRenderer::new()));
        let script = script_artifact("Hi.");
        let handle = JobHandle::new("job-9", item(script.clone()));

        let mut status = RenderStatus::new("done");
        status.output_url = Some("https://cdn.example.com/v.mp4".to_string());
        let artifact = exec.into_artifact(&handle, &status).unwrap();
        let video = artifact.as_ugc_video().unwrap();
        assert_eq!(artifact.id, ContentKey::derive(&["video", script.id.as_str()]));
        assert_eq!(artifact.status, ArtifactStatus::Completed);
        assert_eq!(video.video_url, "https://cdn.example.com/v.mp4");
        assert_eq!(video.duration_seconds, 24.0);
        assert_eq!(video.script_id, script.id);

        let err = exec.into_artifact(&handle, &RenderStatus::new("done")).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
    }

    #[test]
    fn test_preview_counts_without_rendering() {
        let ready = item(script_artifact("Look at this lamp."));
        let silent = WorkItem::UgcVideo {
            script: Artifact::new(
                ContentKey::derive(&["p2", "review"]),
                "p2",
                "Rug",
                ArtifactStatus::Generated,
                Payload::UgcScript(UgcScript::default()),
            ),
            image_url: None,
        };
        let tally = preview_video_renders(&[ready.clone(), silent], &StoreIndex::default());
        assert_eq!(tally, StageTally { generated: 1, skipped: 0, failed: 1 });

        let mut existing = StoreIndex::default();
        existing.insert(&ready.key());
        let tally = preview_video_renders(&[ready], &existing);
        assert_eq!(tally, StageTally { generated: 0, skipped: 1, failed: 0 });
    }
}
