//! Persistent stores for the catalog and every artifact collection.
//!
//! All state of a run lives here; executors are stateless between calls.
//! The layout under the data directory is fixed:
//!
//! | file | records |
//! |------|---------|
//! | `products.json` | catalog |
//! | `enhanced_images.json` | image-enhance artifacts |
//! | `ad_copies.json` | ad-copy artifacts |
//! | `ugc_scripts.json` | UGC-script artifacts |
//! | `ugc_videos.json` | UGC-video artifacts |
//!
//! Stores are not locked. Two processes must not run against the same data
//! directory at the same time.

mod json_store;

pub use json_store::{JsonStore, MergePolicy, MergeReport, StoreIndex, StoreRecord};

use std::path::{Path, PathBuf};

use crate::core::{Artifact, Product, StageName};

/// Handles for every store under one data directory.
#[derive(Debug, Clone)]
pub struct StoreSet {
    data_dir: PathBuf,
    /// Product catalog.
    pub products: JsonStore<Product>,
    /// Enhanced image references.
    pub enhanced_images: JsonStore<Artifact>,
    /// Ad copy variations.
    pub ad_copies: JsonStore<Artifact>,
    /// UGC scripts.
    pub ugc_scripts: JsonStore<Artifact>,
    /// Rendered UGC videos.
    pub ugc_videos: JsonStore<Artifact>,
}

impl StoreSet {
    /// Creates store handles rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            products: JsonStore::new(data_dir.join("products.json")),
            enhanced_images: JsonStore::new(data_dir.join("enhanced_images.json")),
            ad_copies: JsonStore::new(data_dir.join("ad_copies.json")),
            ugc_scripts: JsonStore::new(data_dir.join("ugc_scripts.json")),
            ugc_videos: JsonStore::new(data_dir.join("ugc_videos.json")),
            data_dir,
        }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the artifact store a generation stage writes to.
    #[must_use]
    pub fn artifacts_for(&self, stage: StageName) -> Option<&JsonStore<Artifact>> {
        match stage {
            StageName::ImageEnhance => Some(&self.enhanced_images),
            StageName::AdCopy => Some(&self.ad_copies),
            StageName::UgcScript => Some(&self.ugc_scripts),
            StageName::UgcVideo => Some(&self.ugc_videos),
            StageName::Import | StageName::Export => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let stores = StoreSet::new("/tmp/adflow-data");
        assert_eq!(stores.products.path(), Path::new("/tmp/adflow-data/products.json"));
        assert_eq!(
            stores.artifacts_for(StageName::AdCopy).map(JsonStore::path),
            Some(Path::new("/tmp/adflow-data/ad_copies.json"))
        );
        assert!(stores.artifacts_for(StageName::Import).is_none());
        assert!(stores.artifacts_for(StageName::Export).is_none());
    }
}
