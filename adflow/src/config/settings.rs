//! Pacing, timeouts, run flags and filters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{Product, StageName};

/// Default number of new artifacts buffered before a store flush.
pub const DEFAULT_FLUSH_EVERY: usize = 25;

/// Pacing and deadline settings for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSettings {
    /// Minimum spacing between two executor invocations.
    pub min_interval: Duration,
    /// Hard deadline of a single executor invocation.
    pub call_timeout: Duration,
    /// New artifacts buffered before an incremental store write.
    pub flush_every: usize,
}

impl StageSettings {
    /// Creates settings with the default flush size.
    #[must_use]
    pub fn new(min_interval: Duration, call_timeout: Duration) -> Self {
        Self {
            min_interval,
            call_timeout,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }

    /// Sets the flush size. Zero is treated as one.
    #[must_use]
    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every.max(1);
        self
    }

    /// Sets the minimum inter-call spacing.
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Sets the per-call deadline.
    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

/// Polling settings for asynchronous remote jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait between two status requests.
    pub interval: Duration,
    /// Status requests allowed before the job times out.
    pub max_attempts: u32,
    /// Deadline of a single status request.
    pub request_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_attempts: 60,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PollSettings {
    /// Upper bound on the time spent polling one job.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Settings for every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Product import.
    pub import: StageSettings,
    /// Image enhancement.
    pub image_enhance: StageSettings,
    /// Ad copy generation.
    pub ad_copy: StageSettings,
    /// UGC script generation.
    pub ugc_script: StageSettings,
    /// Video job submission.
    pub ugc_video: StageSettings,
    /// Video job polling.
    pub poll: PollSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let secs = Duration::from_secs;
        let millis = Duration::from_millis;
        Self {
            import: StageSettings::new(Duration::ZERO, secs(30)),
            image_enhance: StageSettings::new(secs(1), secs(120)),
            ad_copy: StageSettings::new(millis(500), secs(60)),
            ugc_script: StageSettings::new(millis(500), secs(90)),
            ugc_video: StageSettings::new(secs(2), secs(60)),
            poll: PollSettings::default(),
        }
    }
}

impl PipelineSettings {
    /// Settings with every delay removed, for tests and dry runs.
    #[must_use]
    pub fn immediate() -> Self {
        let mut settings = Self::default();
        for stage in StageName::ORDER {
            if let Some(s) = settings.stage_mut(stage) {
                s.min_interval = Duration::ZERO;
            }
        }
        settings.poll.interval = Duration::ZERO;
        settings
    }

    /// Returns the settings of a stage. Export has none.
    #[must_use]
    pub fn stage(&self, stage: StageName) -> Option<&StageSettings> {
        match stage {
            StageName::Import => Some(&self.import),
            StageName::ImageEnhance => Some(&self.image_enhance),
            StageName::AdCopy => Some(&self.ad_copy),
            StageName::UgcScript => Some(&self.ugc_script),
            StageName::UgcVideo => Some(&self.ugc_video),
            StageName::Export => None,
        }
    }

    fn stage_mut(&mut self, stage: StageName) -> Option<&mut StageSettings> {
        match stage {
            StageName::Import => Some(&mut self.import),
            StageName::ImageEnhance => Some(&mut self.image_enhance),
            StageName::AdCopy => Some(&mut self.ad_copy),
            StageName::UgcScript => Some(&mut self.ugc_script),
            StageName::UgcVideo => Some(&mut self.ugc_video),
            StageName::Export => None,
        }
    }

    /// Applies one flush size to every stage.
    #[must_use]
    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        for stage in StageName::ORDER {
            if let Some(s) = self.stage_mut(stage) {
                *s = s.with_flush_every(flush_every);
            }
        }
        self
    }
}

/// Run flags selecting which stages execute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFlags {
    /// Skip image enhancement.
    pub skip_images: bool,
    /// Skip background removal inside image enhancement.
    pub skip_backgrounds: bool,
    /// Skip lifestyle scenes inside image enhancement.
    pub skip_lifestyle: bool,
    /// Skip video rendering.
    pub skip_videos: bool,
    /// Only import and ad copy.
    pub ads_only: bool,
    /// Only import and UGC scripts.
    pub scripts_only: bool,
    /// Only export what is already stored.
    pub export_only: bool,
    /// Log the video renders a run would submit without calling the renderer.
    pub dry_run: bool,
}

/// Narrows the work items of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFilters {
    /// Only this product.
    pub product_id: Option<String>,
    /// Only this ad platform.
    pub platform: Option<String>,
    /// Only this UGC angle.
    pub ugc_type: Option<String>,
}

impl RunFilters {
    /// Returns true if the product passes the product filter.
    #[must_use]
    pub fn matches_product(&self, product: &Product) -> bool {
        self.matches_product_id(&product.id)
    }

    /// Returns true if the product id passes the product filter.
    #[must_use]
    pub fn matches_product_id(&self, product_id: &str) -> bool {
        self.product_id.as_deref().map_or(true, |id| id == product_id)
    }
}
