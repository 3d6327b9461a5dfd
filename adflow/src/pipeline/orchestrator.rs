//! Top-level run sequencing.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use super::{RunResult, StagePlan, StageReport, StoreCounts};
use crate::collaborators::{BackgroundRemover, Collaborators, SceneGenerator};
use crate::config::AppConfig;
use crate::core::{StageName, StageStatus};
use crate::errors::FlowError;
use crate::events::{
    EventSink, NoOpEventSink, PIPELINE_ABORTED, PIPELINE_COMPLETED, PIPELINE_STARTED,
    STAGE_COMPLETED, STAGE_STARTED,
};
use crate::observability::SpanTimer;
use crate::runner::{RateLimitedRunner, StageTally};
use crate::stages::{
    ad_copy_items, image_items, preview_video_renders, ugc_script_items, ugc_video_items,
    AdCopyExecutor, ExportStage, ImageEnhanceExecutor, ImportStage, JobTracker, UgcScriptExecutor,
    UgcVideoExecutor,
};
use crate::store::{JsonStore, StoreRecord, StoreSet};

/// Runs the stages of one pipeline run in fixed order.
///
/// Import failing while the catalog is empty aborts the run. Any other
/// stage failure is recorded and the run continues. [`Orchestrator::run`]
/// never fails; callers inspect the returned [`RunResult`].
pub struct Orchestrator {
    config: AppConfig,
    collaborators: Collaborators,
    stores: StoreSet,
    plan: StagePlan,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("data_dir", &self.stores.data_dir())
            .field("plan", &self.plan)
            .field("collaborators", &self.collaborators)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator over the stores in `config.data_dir`.
    #[must_use]
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let stores = StoreSet::new(config.data_dir.clone());
        let plan = StagePlan::from_flags(&config.flags);
        Self {
            config,
            collaborators,
            stores,
            plan,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the stores this run reads and writes.
    #[must_use]
    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    /// Returns the stage plan.
    #[must_use]
    pub fn plan(&self) -> StagePlan {
        self.plan
    }

    /// Runs every planned stage and returns the summary.
    pub async fn run(&self) -> RunResult {
        let timer = SpanTimer::start("pipeline");
        let mut result = RunResult::new(Utc::now());
        let planned: Vec<&str> = self.plan.stages().iter().map(StageName::as_str).collect();

        tracing::info!(run_id = %result.run_id, stages = ?planned, "Pipeline started");
        self.events
            .emit(
                PIPELINE_STARTED,
                Some(json!({ "run_id": result.run_id.to_string(), "stages": planned })),
            )
            .await;

        for stage in StageName::ORDER {
            let report = match self.skip_reason(stage) {
                Some(reason) => {
                    tracing::info!(stage = %stage, reason, "Stage skipped");
                    StageReport::skipped(stage, reason)
                }
                None => self.run_stage(stage).await,
            };
            self.emit_stage_completed(&report).await;

            let fatal = (stage == StageName::Import
                && report.status == StageStatus::Failed
                && self.catalog_is_empty())
            .then(|| {
                let reason = report.error.clone().unwrap_or_else(|| "feed had no usable products".to_string());
                FlowError::NoCatalog(reason)
            });
            result.stages.push(report);

            if let Some(err) = fatal {
                result.aborted = true;
                tracing::error!(run_id = %result.run_id, error = %err, "Aborting run");
                self.events
                    .emit(
                        PIPELINE_ABORTED,
                        Some(json!({
                            "run_id": result.run_id.to_string(),
                            "stage": stage.as_str(),
                            "error": err.to_string(),
                        })),
                    )
                    .await;
                break;
            }
        }

        result.counts = self.store_counts();
        result.elapsed = timer.finish();

        let failed: Vec<&str> = result.failed_stages().iter().map(StageName::as_str).collect();
        tracing::info!(
            run_id = %result.run_id,
            success = result.is_success(),
            aborted = result.aborted,
            failed_stages = ?failed,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Pipeline finished"
        );
        self.events
            .emit(
                PIPELINE_COMPLETED,
                Some(json!({
                    "run_id": result.run_id.to_string(),
                    "success": result.is_success(),
                    "aborted": result.aborted,
                    "failed_stages": failed,
                })),
            )
            .await;
        result
    }

    fn skip_reason(&self, stage: StageName) -> Option<&'static str> {
        if !self.plan.includes(stage) {
            return Some("disabled by run flags");
        }
        let c = &self.collaborators;
        match stage {
            StageName::Import => None,
            StageName::ImageEnhance if matches!(self.image_services(), (None, None)) => {
                Some("no image service enabled")
            }
            StageName::AdCopy | StageName::UgcScript if c.text.is_none() => Some("no text generator configured"),
            StageName::UgcVideo if c.video.is_none() && !self.config.flags.dry_run => {
                Some("no video renderer configured")
            }
            StageName::Export if c.exporter.is_none() => Some("no exporter configured"),
            _ => None,
        }
    }

    async fn run_stage(&self, stage: StageName) -> StageReport {
        let timer = SpanTimer::start(stage.as_str());
        tracing::info!(stage = %stage, "Stage started");
        self.events
            .emit(STAGE_STARTED, Some(json!({ "stage": stage.as_str() })))
            .await;

        match self.execute(stage).await {
            Ok(tally) => {
                let report = StageReport::finished(stage, tally, timer.finish());
                tracing::info!(stage = %stage, status = %report.status, %tally, "Stage finished");
                report
            }
            Err(err) => {
                tracing::warn!(stage = %stage, error = %err, "Stage failed");
                StageReport::errored(stage, StageTally::default(), err.to_string(), timer.finish())
            }
        }
    }

    async fn execute(&self, stage: StageName) -> Result<StageTally, FlowError> {
        let config = &self.config;
        let filters = &config.filters;
        let stores = &self.stores;
        let events = self.events.as_ref();
        let c = &self.collaborators;

        match stage {
            StageName::Import => {
                let outcome = ImportStage::new(
                    c.catalog.as_deref(),
                    &stores.products,
                    config.settings.import.call_timeout,
                )
                .run()
                .await?;
                Ok(outcome.tally)
            }
            StageName::ImageEnhance => {
                let (backgrounds, scenes) = self.image_services();
                let items = image_items(&stores.products.load_all()?, filters);
                let executor = ImageEnhanceExecutor::new(backgrounds, scenes);
                Ok(RateLimitedRunner::new(stage, &stores.enhanced_images, config, events)
                    .run(&executor, None, items)
                    .await?)
            }
            StageName::AdCopy => {
                let Some(text) = &c.text else {
                    return Ok(StageTally::default());
                };
                let items = ad_copy_items(&stores.products.load_all()?, &config.platforms, filters);
                let executor = AdCopyExecutor::new(text.clone());
                Ok(RateLimitedRunner::new(stage, &stores.ad_copies, config, events)
                    .run(&executor, None, items)
                    .await?)
            }
            StageName::UgcScript => {
                let Some(text) = &c.text else {
                    return Ok(StageTally::default());
                };
                let items = ugc_script_items(&stores.products.load_all()?, &config.platforms, filters);
                let executor = UgcScriptExecutor::new(text.clone());
                Ok(RateLimitedRunner::new(stage, &stores.ugc_scripts, config, events)
                    .run(&executor, None, items)
                    .await?)
            }
            StageName::UgcVideo => {
                let items = ugc_video_items(
                    &stores.ugc_scripts.load_all()?,
                    &stores.products.load_all()?,
                    &stores.enhanced_images.load_all()?,
                    filters,
                );
                if config.flags.dry_run {
                    return Ok(preview_video_renders(&items, &stores.ugc_videos.index()?));
                }
                let Some(video) = &c.video else {
                    return Ok(StageTally::default());
                };
                let executor = UgcVideoExecutor::new(video.clone());
                Ok(RateLimitedRunner::new(stage, &stores.ugc_videos, config, events)
                    .run(&executor, Some(&executor as &dyn JobTracker), items)
                    .await?)
            }
            StageName::Export => {
                let Some(exporter) = &c.exporter else {
                    return Ok(StageTally::default());
                };
                let outcome = ExportStage::new(exporter.as_ref(), stores).run().await?;
                for file in &outcome.files {
                    tracing::info!(file = %file.display(), artifacts = outcome.exported, "Export written");
                }
                Ok(StageTally {
                    generated: outcome.files.len(),
                    ..StageTally::default()
                })
            }
        }
    }

    async fn emit_stage_completed(&self, report: &StageReport) {
        self.events
            .emit(
                STAGE_COMPLETED,
                Some(json!({
                    "stage": report.stage.as_str(),
                    "status": report.status.to_string(),
                    "generated": report.tally.generated,
                    "skipped": report.tally.skipped,
                    "failed": report.tally.failed,
                    "error": report.error,
                    "elapsed_ms": report.elapsed.as_millis() as u64,
                })),
            )
            .await;
    }

    fn image_services(&self) -> (Option<Arc<dyn BackgroundRemover>>, Option<Arc<dyn SceneGenerator>>) {
        let flags = &self.config.flags;
        let c = &self.collaborators;
        (
            c.backgrounds.clone().filter(|_| !flags.skip_backgrounds),
            c.scenes.clone().filter(|_| !flags.skip_lifestyle),
        )
    }

    fn catalog_is_empty(&self) -> bool {
        self.stores.products.len().map_or(true, |n| n == 0)
    }

    fn store_counts(&self) -> StoreCounts {
        let s = &self.stores;
        StoreCounts {
            products: count(&s.products),
            enhanced_images: count(&s.enhanced_images),
            ad_copies: count(&s.ad_copies),
            ugc_scripts: count(&s.ugc_scripts),
            ugc_videos: count(&s.ugc_videos),
        }
    }
}

fn count<T: StoreRecord>(store: &JsonStore<T>) -> usize {
    store.len().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Cannot count store");
        0
    })
}
