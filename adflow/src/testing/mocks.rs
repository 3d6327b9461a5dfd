//! Scripted collaborators and executors for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::fixtures;
use crate::collaborators::{
    BackgroundRemover, BackgroundRequest, BackgroundResponse, CatalogSource, Exporter, FeedRecord,
    RenderRequest, RenderStatus, SceneGenerator, SceneRequest, SceneResponse, SubmitResponse,
    TextGenerator, TextRequest, VideoRenderer,
};
use crate::config::AppConfig;
use crate::core::{Artifact, ProductRecord, StageName, WorkItem};
use crate::errors::{ExportError, FailureKind, RemoteError, StageFailure};
use crate::stages::{ExecutionOutcome, JobHandle, JobTracker, StageExecutor, UgcVideoExecutor};
use crate::store::JsonStore;

/// What a [`ScriptedExecutor`] does on one call.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    /// Return the artifact from [`fixtures::artifact_for`].
    Generate,
    /// Return a failure of the given kind.
    Fail(FailureKind),
    /// Panic inside the executor.
    Panic,
    /// Sleep, then generate.
    Hang(Duration),
    /// Return an async handle with the given job id.
    Handle(&'static str),
}

/// An executor whose behavior is scripted per call index.
///
/// Calls without a scripted step generate.
#[derive(Debug)]
pub struct ScriptedExecutor {
    stage: StageName,
    steps: HashMap<usize, ScriptedStep>,
    calls: Mutex<usize>,
    observed: Option<JsonStore<Artifact>>,
    store_sizes: Mutex<Vec<usize>>,
}

impl ScriptedExecutor {
    /// Creates an executor that generates on every call.
    #[must_use]
    pub fn new(stage: StageName) -> Self {
        Self {
            stage,
            steps: HashMap::new(),
            calls: Mutex::new(0),
            observed: None,
            store_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the call at `index` (0-based).
    #[must_use]
    pub fn with_step(mut self, index: usize, step: ScriptedStep) -> Self {
        self.steps.insert(index, step);
        self
    }

    /// Records the size of `store` at the start of every call.
    #[must_use]
    pub fn observing_store(mut self, store: JsonStore<Artifact>) -> Self {
        self.observed = Some(store);
        self
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    /// Returns the observed store sizes, one per call.
    #[must_use]
    pub fn observed_store_sizes(&self) -> Vec<usize> {
        self.store_sizes.lock().clone()
    }
}

#[async_trait]
impl StageExecutor for ScriptedExecutor {
    fn stage(&self) -> StageName {
        self.stage
    }

    async fn execute(&self, item: &WorkItem, _config: &AppConfig) -> ExecutionOutcome {
        let index = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls - 1
        };
        if let Some(store) = &self.observed {
            let size = store.len().unwrap_or_default();
            self.store_sizes.lock().push(size);
        }

        match self.steps.get(&index).cloned().unwrap_or(ScriptedStep::Generate) {
            ScriptedStep::Generate => ExecutionOutcome::Artifact(fixtures::artifact_for(item)),
            ScriptedStep::Fail(kind) => StageFailure::new(kind, format!("scripted failure on call {index}")).into(),
            ScriptedStep::Panic => panic!("scripted panic on call {index}"),
            ScriptedStep::Hang(duration) => {
                tokio::time::sleep(duration).await;
                ExecutionOutcome::Artifact(fixtures::artifact_for(item))
            }
            ScriptedStep::Handle(job_id) => ExecutionOutcome::AsyncHandle(JobHandle::new(job_id, item.clone())),
        }
    }
}

/// Text generator that answers every prompt with one canned JSON document.
///
/// The document parses both as ad copy and as a UGC script.
#[derive(Debug, Default)]
pub struct CannedTextGenerator {
    failing_on: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedTextGenerator {
    /// Creates a generator that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with a transport error for prompts containing `needle`.
    #[must_use]
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.failing_on.push(needle.into());
        self
    }

    /// Returns the number of prompts received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Returns the prompts received, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// The canned completion, wrapped in a code fence.
    #[must_use]
    pub fn reply() -> String {
        let body = serde_json::json!({
            "headline": "Sleep better tonight",
            "primary_text": "Soft linen that breathes.",
            "description": "Stonewashed and pre-shrunk.",
            "description_line_1": "Free shipping over $50.",
            "description_line_2": "30 night trial.",
            "ad_text": "POV: your bed finally feels like a hotel",
            "caption": "#linen #sleep",
            "title": "Linen bedding ideas",
            "cta": "Shop now",
            "hook": "I was skeptical about linen sheets.",
            "scenes": [
                {"dialogue": "Week one and I sleep cooler.", "visual": "Bed close-up", "duration_seconds": 10},
                {"dialogue": "They get softer every wash.", "visual": "Laundry", "duration_seconds": 10}
            ],
            "total_duration_seconds": 30
        });
        format!("```json\n{body}\n```")
    }
}

#[async_trait]
impl TextGenerator for CannedTextGenerator {
    async fn generate(&self, request: &TextRequest) -> Result<String, RemoteError> {
        self.prompts.lock().push(request.prompt.clone());
        if self.failing_on.iter().any(|needle| request.prompt.contains(needle.as_str())) {
            return Err(RemoteError::Transport("scripted connection reset".to_string()));
        }
        Ok(Self::reply())
    }
}

/// Background remover returning a fixed reply.
#[derive(Debug)]
pub struct ScriptedBackgroundRemover {
    reply: Result<BackgroundResponse, RemoteError>,
    requests: Mutex<Vec<BackgroundRequest>>,
}

impl ScriptedBackgroundRemover {
    /// Creates a remover that always returns `reply`.
    #[must_use]
    pub fn new(reply: Result<BackgroundResponse, RemoteError>) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the requests received.
    #[must_use]
    pub fn requests(&self) -> Vec<BackgroundRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl BackgroundRemover for ScriptedBackgroundRemover {
    async fn remove_background(&self, request: &BackgroundRequest) -> Result<BackgroundResponse, RemoteError> {
        self.requests.lock().push(request.clone());
        self.reply.clone()
    }
}

/// Scene generator returning a fixed reply, or numbered scene URLs.
#[derive(Debug)]
pub struct ScriptedSceneGenerator {
    reply: Option<Result<SceneResponse, RemoteError>>,
    requests: Mutex<Vec<SceneRequest>>,
}

impl ScriptedSceneGenerator {
    /// Creates a generator that always returns `reply`.
    #[must_use]
    pub fn new(reply: Result<SceneResponse, RemoteError>) -> Self {
        Self {
            reply: Some(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a generator answering call `n` with `https://cdn.example.com/scene-<n>.png`.
    #[must_use]
    pub fn numbered() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns the requests received.
    #[must_use]
    pub fn requests(&self) -> Vec<SceneRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SceneGenerator for ScriptedSceneGenerator {
    async fn generate_scene(&self, request: &SceneRequest) -> Result<SceneResponse, RemoteError> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };
        self.reply.clone().unwrap_or_else(|| {
            Ok(SceneResponse {
                scene_url: Some(format!("https://cdn.example.com/scene-{call}.png")),
            })
        })
    }
}

/// Video renderer with a scripted submit reply and status queue.
///
/// Once the queue is drained every status request returns the fallback.
#[derive(Debug)]
pub struct ScriptedRenderer {
    job_id: Option<String>,
    statuses: Mutex<VecDeque<Result<RenderStatus, RemoteError>>>,
    fallback: RenderStatus,
    submitted: Mutex<Vec<RenderRequest>>,
    polls: Mutex<usize>,
}

impl Default for ScriptedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRenderer {
    /// Creates a renderer whose submissions carry no job id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            job_id: None,
            statuses: Mutex::new(VecDeque::new()),
            fallback: RenderStatus::new("processing"),
            submitted: Mutex::new(Vec::new()),
            polls: Mutex::new(0),
        }
    }

    /// Sets the job id returned by every submission.
    #[must_use]
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Queues status replies.
    #[must_use]
    pub fn with_statuses(self, statuses: Vec<Result<RenderStatus, RemoteError>>) -> Self {
        self.statuses.lock().extend(statuses);
        self
    }

    /// Sets the reply used once the queue is drained.
    #[must_use]
    pub fn with_fallback(mut self, status: RenderStatus) -> Self {
        self.fallback = status;
        self
    }

    /// Returns the submitted requests.
    #[must_use]
    pub fn submitted(&self) -> Vec<RenderRequest> {
        self.submitted.lock().clone()
    }

    /// Returns the number of status requests.
    #[must_use]
    pub fn polls(&self) -> usize {
        *self.polls.lock()
    }
}

#[async_trait]
impl VideoRenderer for ScriptedRenderer {
    async fn submit(&self, request: &RenderRequest) -> Result<SubmitResponse, RemoteError> {
        self.submitted.lock().push(request.clone());
        Ok(SubmitResponse {
            id: self.job_id.clone(),
        })
    }

    async fn status(&self, _job_id: &str) -> Result<RenderStatus, RemoteError> {
        *self.polls.lock() += 1;
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Job tracker backed by a [`ScriptedRenderer`] and the real video executor.
#[derive(Debug)]
pub struct ScriptedTracker {
    renderer: Arc<ScriptedRenderer>,
    executor: UgcVideoExecutor,
}

impl ScriptedTracker {
    fn with_renderer(renderer: ScriptedRenderer) -> Self {
        let renderer = Arc::new(renderer);
        Self {
            executor: UgcVideoExecutor::new(renderer.clone()),
            renderer,
        }
    }

    /// Answers every poll with `status`.
    #[must_use]
    pub fn forever(status: RenderStatus) -> Self {
        Self::with_renderer(ScriptedRenderer::new().with_fallback(status))
    }

    /// Answers polls from `replies`, then with "processing".
    #[must_use]
    pub fn sequence(replies: Vec<Result<RenderStatus, RemoteError>>) -> Self {
        Self::with_renderer(ScriptedRenderer::new().with_statuses(replies))
    }

    /// Returns the number of polls made.
    #[must_use]
    pub fn polls(&self) -> usize {
        self.renderer.polls()
    }
}

#[async_trait]
impl JobTracker for ScriptedTracker {
    async fn poll(&self, handle: &JobHandle) -> Result<RenderStatus, RemoteError> {
        self.executor.poll(handle).await
    }

    fn into_artifact(&self, handle: &JobHandle, status: &RenderStatus) -> Result<Artifact, StageFailure> {
        self.executor.into_artifact(handle, status)
    }
}

/// Catalog source returning a fixed reply.
#[derive(Debug)]
pub struct ScriptedCatalog {
    reply: Result<Vec<FeedRecord>, RemoteError>,
    fetches: Mutex<usize>,
}

impl ScriptedCatalog {
    /// Creates a source that always returns `reply`.
    #[must_use]
    pub fn new(reply: Result<Vec<ProductRecord>, RemoteError>) -> Self {
        Self {
            reply: reply.map(|records| records.into_iter().map(Ok).collect()),
            fetches: Mutex::new(0),
        }
    }

    /// Appends a row that cannot be read as a product.
    #[must_use]
    pub fn with_unreadable_row(mut self, reason: impl Into<String>) -> Self {
        if let Ok(rows) = &mut self.reply {
            rows.push(Err(reason.into()));
        }
        self
    }

    /// Creates a source with one record per name.
    #[must_use]
    pub fn named(names: &[&str]) -> Self {
        Self::new(Ok(names
            .iter()
            .map(|name| ProductRecord {
                name: (*name).to_string(),
                image_url: format!("https://shop.example.com/{name}.jpg"),
                ..Default::default()
            })
            .collect()))
    }

    /// Returns the number of fetches made.
    #[must_use]
    pub fn fetches(&self) -> usize {
        *self.fetches.lock()
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch(&self) -> Result<Vec<FeedRecord>, RemoteError> {
        *self.fetches.lock() += 1;
        self.reply.clone()
    }

    fn describe(&self) -> String {
        "scripted catalog".to_string()
    }
}

/// Exporter that records the collection sizes it was handed.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    fail: bool,
    exports: Mutex<Vec<(usize, usize, usize)>>,
}

impl RecordingExporter {
    /// Creates an exporter that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an exporter that always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Returns `(ads, scripts, videos)` for every export call.
    #[must_use]
    pub fn exports(&self) -> Vec<(usize, usize, usize)> {
        self.exports.lock().clone()
    }
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn export(
        &self,
        ads: &[Artifact],
        scripts: &[Artifact],
        videos: &[Artifact],
    ) -> Result<Vec<PathBuf>, ExportError> {
        self.exports.lock().push((ads.len(), scripts.len(), videos.len()));
        if self.fail {
            return Err(ExportError::Io(std::io::Error::other("scripted disk full")));
        }
        Ok(vec![PathBuf::from("exports/recorded.json")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::parse_completion;
    use crate::core::{AdCopy, UgcScript};
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn test_canned_reply_parses_as_both_payloads() {
        let reply = CannedTextGenerator::reply();
        let ad: AdCopy = assert_ok!(parse_completion(&reply));
        assert!(ad.missing_fields("meta").is_empty());
        assert!(ad.missing_fields("pinterest").is_empty());

        let script: UgcScript = assert_ok!(parse_completion(&reply));
        assert_eq!(script.scenes.len(), 2);
    }

    #[test]
    fn test_canned_generator_fails_on_needle() {
        let text = CannedTextGenerator::new().failing_on("Throw");
        assert_err!(block_on(text.generate(&TextRequest::new("sys", "Linen Throw"))));
        assert_ok!(block_on(text.generate(&TextRequest::new("sys", "Desk Lamp"))));
        assert_eq!(text.calls(), 2);
    }

    #[test]
    fn test_numbered_scenes() {
        let scenes = ScriptedSceneGenerator::numbered();
        let request = SceneRequest {
            product_id: "p1".to_string(),
            image_url: "https://shop.example.com/lamp.jpg".to_string(),
            theme: "marble".to_string(),
        };
        assert_eq!(
            block_on(scenes.generate_scene(&request)).unwrap().scene_url.as_deref(),
            Some("https://cdn.example.com/scene-1.png")
        );
        assert_eq!(
            block_on(scenes.generate_scene(&request)).unwrap().scene_url.as_deref(),
            Some("https://cdn.example.com/scene-2.png")
        );
        assert_eq!(scenes.requests().len(), 2);
    }

    #[test]
    fn test_renderer_drains_queue_then_falls_back() {
        let renderer = ScriptedRenderer::new()
            .with_statuses(vec![Ok(RenderStatus::new("queued"))])
            .with_fallback(RenderStatus::new("done"));
        assert_eq!(block_on(renderer.status("j")).unwrap().status, "queued");
        assert_eq!(block_on(renderer.status("j")).unwrap().status, "done");
        assert_eq!(block_on(renderer.status("j")).unwrap().status, "done");
        assert_eq!(renderer.polls(), 3);
    }
}
