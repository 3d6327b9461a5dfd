//! Sequential, paced, idempotent stage runner.

use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use super::{AsyncJobPoller, Pacer, StageTally};
use crate::config::{AppConfig, PollSettings, StageSettings};
use crate::core::{Artifact, ContentKey, StageName, WorkItem};
use crate::errors::{FailureKind, StageFailure, StoreError};
use crate::events::{EventSink, ITEM_FAILED, ITEM_GENERATED, ITEM_SKIPPED};
use crate::stages::{ExecutionOutcome, JobTracker, StageExecutor};
use crate::store::{JsonStore, MergePolicy};

/// Drives one stage's executor over its items.
///
/// Items whose key is already stored are skipped without a call. Item
/// failures are counted and never stop the loop. New artifacts are
/// written every `flush_every` items and once more at the end, so a crash
/// loses at most one unflushed batch.
pub struct RateLimitedRunner<'a> {
    stage: StageName,
    store: &'a JsonStore<Artifact>,
    config: &'a AppConfig,
    events: &'a dyn EventSink,
    settings: StageSettings,
    poll: PollSettings,
}

impl<'a> RateLimitedRunner<'a> {
    /// Creates a runner using the stage's configured settings.
    #[must_use]
    pub fn new(
        stage: StageName,
        store: &'a JsonStore<Artifact>,
        config: &'a AppConfig,
        events: &'a dyn EventSink,
    ) -> Self {
        let settings = config
            .settings
            .stage(stage)
            .copied()
            .unwrap_or_else(|| config.settings.ad_copy);
        Self {
            stage,
            store,
            config,
            events,
            settings,
            poll: config.settings.poll,
        }
    }

    /// Overrides the stage settings.
    #[must_use]
    pub fn with_settings(mut self, settings: StageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs every item through `executor`.
    ///
    /// `tracker` follows remote jobs; without one, a job handle counts as an
    /// unexpected failure. Only store errors are returned as `Err`.
    pub async fn run(
        &self,
        executor: &dyn StageExecutor,
        tracker: Option<&dyn JobTracker>,
        items: Vec<WorkItem>,
    ) -> Result<StageTally, StoreError> {
        let mut index = self.store.index()?;
        let mut tally = StageTally::default();
        let mut batch = Vec::new();
        let mut pacer = Pacer::new(self.settings.min_interval);
        let flush_every = self.settings.flush_every.max(1);

        tracing::info!(stage = %self.stage, items = items.len(), stored = index.len(), "Running stage items");

        for item in items {
            let key = item.key();
            if index.contains(&key) {
                tally.skipped += 1;
                tracing::debug!(stage = %self.stage, key = %key, item = %item.label(), "Already stored, skipping");
                self.emit_item(ITEM_SKIPPED, &key, None).await;
                continue;
            }

            pacer.wait().await;
            let result = self.invoke(executor, tracker, &item).await;
            pacer.mark();

            match result {
                Ok(artifact) => {
                    tally.generated += 1;
                    index.insert(&key);
                    tracing::info!(stage = %self.stage, key = %key, item = %item.label(), "Generated");
                    self.emit_item(ITEM_GENERATED, &key, None).await;
                    batch.push(artifact);
                    if batch.len() >= flush_every {
                        self.flush(&mut batch)?;
                    }
                }
                Err(failure) => {
                    tally.failed += 1;
                    if failure.kind == FailureKind::Unexpected {
                        tracing::error!(stage = %self.stage, key = %key, item = %item.label(), kind = %failure.kind, message = %failure.message, "Item failed");
                    } else {
                        tracing::warn!(stage = %self.stage, key = %key, item = %item.label(), kind = %failure.kind, message = %failure.message, "Item failed");
                    }
                    self.emit_item(ITEM_FAILED, &key, Some(&failure)).await;
                }
            }
        }

        self.flush(&mut batch)?;
        tracing::info!(stage = %self.stage, %tally, "Stage items done");
        Ok(tally)
    }

    async fn invoke(
        &self,
        executor: &dyn StageExecutor,
        tracker: Option<&dyn JobTracker>,
        item: &WorkItem,
    ) -> Result<Artifact, StageFailure> {
        let attempt = async {
            let call = tokio::time::timeout(self.settings.call_timeout, executor.execute(item, self.config)).await;
            let Ok(outcome) = call else {
                return Err(StageFailure::new(
                    FailureKind::Timeout,
                    format!("no response within {}s", self.settings.call_timeout.as_secs_f64()),
                ));
            };
            match outcome {
                ExecutionOutcome::Artifact(artifact) => Ok(artifact),
                ExecutionOutcome::Failure(failure) => Err(failure),
                ExecutionOutcome::AsyncHandle(handle) => match tracker {
                    Some(tracker) => AsyncJobPoller::new(tracker, self.poll, self.events)
                        .resolve(handle)
                        .await
                        .into_result(),
                    None => Err(StageFailure::unexpected(format!(
                        "{} returned job {} but the stage has no job tracker",
                        self.stage, handle.job_id
                    ))),
                },
            }
        };

        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(StageFailure::unexpected(format!(
                "executor panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    fn flush(&self, batch: &mut Vec<Artifact>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let report = self.store.upsert_all(std::mem::take(batch), MergePolicy::KeepExisting)?;
        tracing::debug!(stage = %self.stage, inserted = report.inserted, total = report.total, "Flushed artifacts");
        Ok(())
    }

    async fn emit_item(&self, event_type: &str, key: &ContentKey, failure: Option<&StageFailure>) {
        let mut data = json!({"stage": self.stage, "key": key});
        if let Some(failure) = failure {
            data["kind"] = json!(failure.kind);
            data["message"] = json!(failure.message);
        }
        self.events.emit(event_type, Some(data)).await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineSettings;
    use crate::events::CollectingEventSink;
    use crate::testing::{fixtures, ScriptedExecutor, ScriptedStep};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn config() -> AppConfig {
        AppConfig::new("config", "data").with_settings(PipelineSettings::immediate())
    }

    #[tokio::test]
    async fn test_generates_then_skips_on_rerun() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("ad_copies.json"));
        let config = config();
        let events = CollectingEventSink::new();
        let items = fixtures::ad_items(2, &["meta", "google"], 2);
        let executor = ScriptedExecutor::new(StageName::AdCopy);

        let runner = RateLimitedRunner::new(StageName::AdCopy, &store, &config, &events);
        let first = runner.run(&executor, None, items.clone()).await.unwrap();
        assert_eq!(first, StageTally { generated: 8, skipped: 0, failed: 0 });
        assert_eq!(store.len().unwrap(), 8);

        let second = runner.run(&executor, None, items).await.unwrap();
        assert_eq!(second, StageTally { generated: 0, skipped: 8, failed: 0 });
        assert_eq!(executor.calls(), 8);
        assert_eq!(events.count(ITEM_SKIPPED), 8);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("ad_copies.json"));
        let config = config();
        let events = CollectingEventSink::new();
        let items = fixtures::ad_items(1, &["meta"], 4);
        let executor = ScriptedExecutor::new(StageName::AdCopy)
            .with_step(1, ScriptedStep::Fail(FailureKind::TransportError))
            .with_step(2, ScriptedStep::Panic);

        let runner = RateLimitedRunner::new(StageName::AdCopy, &store, &config, &events);
        let tally = runner.run(&executor, None, items.clone()).await.unwrap();
        assert_eq!(tally, StageTally { generated: 2, skipped: 0, failed: 2 });

        let stored: Vec<_> = store.load_all().unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(stored, vec![items[0].key(), items[3].key()]);

        let failures = events.events_of_type(ITEM_FAILED);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1].1.as_ref().unwrap()["kind"], "unexpected");
    }

    #[tokio::test]
    async fn test_call_timeout_is_classified() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("ad_copies.json"));
        let config = config();
        let events = CollectingEventSink::new();
        let executor = ScriptedExecutor::new(StageName::AdCopy)
            .with_step(0, ScriptedStep::Hang(Duration::from_secs(5)));

        let runner = RateLimitedRunner::new(StageName::AdCopy, &store, &config, &events)
            .with_settings(StageSettings::new(Duration::ZERO, Duration::from_millis(20)));
        let tally = runner.run(&executor, None, fixtures::ad_items(1, &["meta"], 2)).await.unwrap();
        assert_eq!(tally, StageTally { generated: 1, skipped: 0, failed: 1 });

        let failures = events.events_of_type(ITEM_FAILED);
        assert_eq!(failures[0].1.as_ref().unwrap()["kind"], "timeout");
    }

    #[tokio::test]
    async fn test_flushes_incrementally() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("ad_copies.json"));
        let config = config();
        let events = CollectingEventSink::new();
        // The fourth call observes the store after the first flush of three.
        let executor = ScriptedExecutor::new(StageName::AdCopy).observing_store(store.clone());

        let runner = RateLimitedRunner::new(StageName::AdCopy, &store, &config, &events)
            .with_settings(StageSettings::new(Duration::ZERO, Duration::from_secs(5)).with_flush_every(3));
        let tally = runner.run(&executor, None, fixtures::ad_items(1, &["meta"], 5)).await.unwrap();
        assert_eq!(tally.generated, 5);
        assert_eq!(executor.observed_store_sizes(), vec![0, 0, 0, 3, 3]);
        assert_eq!(store.len().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_enforces_min_interval() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("ad_copies.json"));
        let config = config();
        let events = CollectingEventSink::new();
        let executor = ScriptedExecutor::new(StageName::AdCopy);

        let runner = RateLimitedRunner::new(StageName::AdCopy, &store, &config, &events)
            .with_settings(StageSettings::new(Duration::from_millis(30), Duration::from_secs(5)));
        let start = Instant::now();
        runner.run(&executor, None, fixtures::ad_items(1, &["meta"], 3)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(55));
    }

    #[tokio::test]
    async fn test_duplicate_items_in_one_run_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("ad_copies.json"));
        let config = config();
        let events = CollectingEventSink::new();
        let mut items = fixtures::ad_items(1, &["meta"], 1);
        items.push(items[0].clone());

        let executor = ScriptedExecutor::new(StageName::AdCopy);
        let tally = RateLimitedRunner::new(StageName::AdCopy, &store, &config, &events)
            .run(&executor, None, items)
            .await
            .unwrap();
        assert_eq!(tally, StageTally { generated: 1, skipped: 1, failed: 0 });
    }

    #[tokio::test]
    async fn test_handle_without_tracker_is_unexpected() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("ugc_videos.json"));
        let config = config();
        let events = CollectingEventSink::new();
        let executor = ScriptedExecutor::new(StageName::UgcVideo).with_step(0, ScriptedStep::Handle("job-1"));

        let tally = RateLimitedRunner::new(StageName::UgcVideo, &store, &config, &events)
            .run(&executor, None, vec![fixtures::video_item("p1", "review")])
            .await
            .unwrap();
        assert_eq!(tally.failed, 1);
    }

    #[tokio::test]
    async fn test_corrupt_store_fails_before_any_call() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ad_copies.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonStore::new(path);
        let config = config();
        let events = CollectingEventSink::new();
        let executor = ScriptedExecutor::new(StageName::AdCopy);

        let err = RateLimitedRunner::new(StageName::AdCopy, &store, &config, &events)
            .run(&executor, None, fixtures::ad_items(1, &["meta"], 1))
            .await
            .unwrap_err();
        assert!(err.is_corrupt());
        assert_eq!(executor.calls(), 0);
    }
}
