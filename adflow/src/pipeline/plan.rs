//! Stage selection from run flags.

use crate::config::RunFlags;
use crate::core::StageName;

/// The stages a run will attempt, computed once from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    import: bool,
    image_enhance: bool,
    ad_copy: bool,
    ugc_script: bool,
    ugc_video: bool,
}

impl StagePlan {
    /// Derives the plan.
    ///
    /// `export_only` disables every generating stage and import; the
    /// `*_only` flags keep their own stage and drop the others. Skipping
    /// both background removal and lifestyle scenes skips image enhancement.
    #[must_use]
    pub fn from_flags(flags: &RunFlags) -> Self {
        let narrowed = flags.ads_only || flags.scripts_only || flags.export_only;
        let no_image_work = flags.skip_images || (flags.skip_backgrounds && flags.skip_lifestyle);
        Self {
            import: !flags.export_only,
            image_enhance: !(no_image_work || narrowed),
            ad_copy: !(flags.scripts_only || flags.export_only),
            ugc_script: !(flags.ads_only || flags.export_only),
            ugc_video: !(flags.skip_videos || narrowed),
        }
    }

    /// Returns true if `stage` runs. Export always does.
    #[must_use]
    pub fn includes(&self, stage: StageName) -> bool {
        match stage {
            StageName::Import => self.import,
            StageName::ImageEnhance => self.image_enhance,
            StageName::AdCopy => self.ad_copy,
            StageName::UgcScript => self.ugc_script,
            StageName::UgcVideo => self.ugc_video,
            StageName::Export => true,
        }
    }

    /// The included stages, in execution order.
    #[must_use]
    pub fn stages(&self) -> Vec<StageName> {
        StageName::ORDER.into_iter().filter(|s| self.includes(*s)).collect()
    }
}

impl Default for StagePlan {
    fn default() -> Self {
        Self::from_flags(&RunFlags::default())
    }
}
