//! Units of work handed to stage executors.
//!
//! Identity is derived from the item's fields and never stored twice: the
//! [`ContentKey`] of an item is recomputed on demand by [`WorkItem::key`].

use super::{Artifact, ContentKey, Product};

/// One unit of work for one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkItem {
    /// Enhance the main image of a product.
    ProductImage {
        /// The product whose image is enhanced.
        product: Product,
    },
    /// One ad variation for one product on one platform.
    AdVariant {
        /// The advertised product.
        product: Product,
        /// Target platform.
        platform: String,
        /// 1-based variation number.
        variation: u32,
    },
    /// One UGC script for one product and angle.
    UgcScript {
        /// The featured product.
        product: Product,
        /// UGC angle (review, unboxing, ...).
        ugc_type: String,
    },
    /// One remote render of a stored UGC script.
    UgcVideo {
        /// The stored script artifact.
        script: Artifact,
        /// Image shown in the video, preferring the enhanced one.
        image_url: Option<String>,
    },
}

impl WorkItem {
    /// Derives the content key for this item.
    ///
    /// Part order is fixed per variant:
    /// - product image: `product_id:enhanced`
    /// - ad variant: `product_id:platform:variation`
    /// - UGC script: `product_id:ugc_type`
    /// - UGC video: `video:script_key`
    #[must_use]
    pub fn key(&self) -> ContentKey {
        match self {
            Self::ProductImage { product } => ContentKey::derive(&[product.id.as_str(), "enhanced"]),
            Self::AdVariant {
                product,
                platform,
                variation,
            } => ContentKey::derive(&[
                product.id.as_str(),
                platform.as_str(),
                variation.to_string().as_str(),
            ]),
            Self::UgcScript { product, ugc_type } => {
                ContentKey::derive(&[product.id.as_str(), ugc_type.as_str()])
            }
            Self::UgcVideo { script, .. } => ContentKey::derive(&["video", script.id.as_str()]),
        }
    }

    /// Returns the id of the owning product.
    #[must_use]
    pub fn product_id(&self) -> &str {
        match self {
            Self::ProductImage { product }
            | Self::AdVariant { product, .. }
            | Self::UgcScript { product, .. } => &product.id,
            Self::UgcVideo { script, .. } => &script.product_id,
        }
    }

    /// Returns the name of the owning product.
    #[must_use]
    pub fn product_name(&self) -> &str {
        match self {
            Self::ProductImage { product }
            | Self::AdVariant { product, .. }
            | Self::UgcScript { product, .. } => &product.name,
            Self::UgcVideo { script, .. } => &script.product_name,
        }
    }

    /// Short description for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::ProductImage { product } => format!("{} image", product.name),
            Self::AdVariant {
                product,
                platform,
                variation,
            } => format!("{} {platform} v{variation}", product.name),
            Self::UgcScript { product, ugc_type } => format!("{} {ugc_type}", product.name),
            Self::UgcVideo { script, .. } => format!("{} video of {}", script.product_name, script.id),
        }
    }
}
