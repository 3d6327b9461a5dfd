//! Ready-made products, items and artifacts for tests.

use crate::config::{PlatformConfig, PlatformsConfig};
use crate::core::{
    AdCopy, Artifact, ArtifactStatus, ContentKey, EnhancedImage, Payload, Product, Scene, UgcScript,
    UgcVideo, WorkItem,
};

/// A product with a derived id and an image.
#[must_use]
pub fn product(name: &str) -> Product {
    Product {
        id: Product::derive_id(name, ""),
        name: name.to_string(),
        price: "$19.99".to_string(),
        category: "Home".to_string(),
        description: format!("The {name} you always wanted."),
        image_url: format!("https://shop.example.com/{}.jpg", name.to_lowercase().replace(' ', "-")),
        ..Default::default()
    }
}

/// `count` products named "Product 1", "Product 2", ...
#[must_use]
pub fn products(count: usize) -> Vec<Product> {
    (1..=count).map(|i| product(&format!("Product {i}"))).collect()
}

/// Platform config enabling `names` with `variations` each.
#[must_use]
pub fn platforms(names: &[&str], variations: u32) -> PlatformsConfig {
    names.iter().fold(PlatformsConfig::default(), |cfg, name| {
        cfg.with_platform(
            *name,
            PlatformConfig {
                enabled: true,
                variations_per_product: variations,
                ..Default::default()
            },
        )
    })
}

/// Ad items for `product_count` products × `platforms` × `variations`.
#[must_use]
pub fn ad_items(product_count: usize, platforms: &[&str], variations: u32) -> Vec<WorkItem> {
    let mut items = Vec::new();
    for product in products(product_count) {
        for platform in platforms {
            for variation in 1..=variations {
                items.push(WorkItem::AdVariant {
                    product: product.clone(),
                    platform: (*platform).to_string(),
                    variation,
                });
            }
        }
    }
    items
}

/// A stored UGC script artifact.
#[must_use]
pub fn script_artifact(product_id: &str, ugc_type: &str) -> Artifact {
    Artifact::new(
        ContentKey::derive(&[product_id, ugc_type]),
        product_id,
        format!("Product {product_id}"),
        ArtifactStatus::Generated,
        Payload::UgcScript(UgcScript {
            ugc_type: ugc_type.to_string(),
            hook: "You need to see this.".to_string(),
            scenes: vec![Scene {
                dialogue: "It changed my mornings.".to_string(),
                visual: Some("Close-up".to_string()),
                duration_seconds: Some(10.0),
            }],
            cta: "Tap the link.".to_string(),
            total_duration_seconds: Some(30.0),
            music_suggestion: None,
        }),
    )
}

/// A video item for a freshly built script.
#[must_use]
pub fn video_item(product_id: &str, ugc_type: &str) -> WorkItem {
    WorkItem::UgcVideo {
        script: script_artifact(product_id, ugc_type),
        image_url: None,
    }
}

/// An artifact that a successful executor would produce for `item`.
#[must_use]
pub fn artifact_for(item: &WorkItem) -> Artifact {
    let (status, payload) = match item {
        WorkItem::ProductImage { product } => (
            ArtifactStatus::Generated,
            Payload::EnhancedImage(EnhancedImage {
                source_url: product.image_url.clone(),
                clean_image_url: Some(format!("{}.clean.png", product.image_url)),
                scene_urls: Vec::new(),
            }),
        ),
        WorkItem::AdVariant {
            platform, variation, ..
        } => (
            ArtifactStatus::Generated,
            Payload::AdCopy(AdCopy {
                platform: platform.clone(),
                variation: *variation,
                headline: Some(format!("Headline {variation}")),
                ..Default::default()
            }),
        ),
        WorkItem::UgcScript { ugc_type, .. } => (
            ArtifactStatus::Generated,
            Payload::UgcScript(UgcScript {
                ugc_type: ugc_type.clone(),
                hook: "Hook".to_string(),
                cta: "CTA".to_string(),
                ..Default::default()
            }),
        ),
        WorkItem::UgcVideo { script, .. } => (
            ArtifactStatus::Completed,
            Payload::UgcVideo(UgcVideo {
                script_id: script.id.clone(),
                video_url: format!("https://cdn.example.com/{}.mp4", script.id),
                ..Default::default()
            }),
        ),
    };
    Artifact::new(item.key(), item.product_id(), item.product_name(), status, payload)
}
