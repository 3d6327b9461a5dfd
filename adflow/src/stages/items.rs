//! Work item derivation.
//!
//! Items are rebuilt from the catalog and stores on every run, in catalog
//! order, and narrowed by the run filters.

use std::collections::HashMap;

use crate::config::{PlatformsConfig, RunFilters};
use crate::core::{Artifact, Product, WorkItem};

/// One item per product that has an image.
#[must_use]
pub fn image_items(products: &[Product], filters: &RunFilters) -> Vec<WorkItem> {
    products
        .iter()
        .filter(|p| filters.matches_product(p) && p.image().is_some())
        .map(|p| WorkItem::ProductImage { product: p.clone() })
        .collect()
}

/// Products × enabled platforms × variations.
#[must_use]
pub fn ad_copy_items(products: &[Product], platforms: &PlatformsConfig, filters: &RunFilters) -> Vec<WorkItem> {
    let enabled = platforms.enabled_platforms(filters.platform.as_deref());
    let mut items = Vec::new();
    for product in products.iter().filter(|p| filters.matches_product(p)) {
        for (platform, config) in &enabled {
            for variation in 1..=config.variations_per_product {
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

/// Products × UGC types.
#[must_use]
pub fn ugc_script_items(products: &[Product], platforms: &PlatformsConfig, filters: &RunFilters) -> Vec<WorkItem> {
    let ugc_types = platforms.ugc_types(filters.ugc_type.as_deref());
    products
        .iter()
        .filter(|p| filters.matches_product(p))
        .flat_map(|p| {
            ugc_types.iter().map(move |t| WorkItem::UgcScript {
                product: p.clone(),
                ugc_type: (*t).to_string(),
            })
        })
        .collect()
}

/// One render per stored script.
///
/// The video shows the background-removed product image when one exists,
/// otherwise the catalog image.
#[must_use]
pub fn ugc_video_items(
    scripts: &[Artifact],
    products: &[Product],
    enhanced: &[Artifact],
    filters: &RunFilters,
) -> Vec<WorkItem> {
    let catalog_images: HashMap<&str, &str> = products
        .iter()
        .filter_map(|p| p.image().map(|url| (p.id.as_str(), url)))
        .collect();
    let enhanced_images: HashMap<&str, &str> = enhanced
        .iter()
        .filter_map(|a| {
            a.as_enhanced_image()
                .and_then(|img| img.clean_image_url.as_deref())
                .map(|url| (a.product_id.as_str(), url))
        })
        .collect();

    scripts
        .iter()
        .filter(|s| filters.matches_product_id(&s.product_id))
        .filter(|s| {
            let ugc_type = s.as_ugc_script().map(|p| p.ugc_type.as_str());
            filters.ugc_type.as_deref().map_or(true, |t| ugc_type == Some(t))
        })
        .map(|s| WorkItem::UgcVideo {
            script: s.clone(),
            image_url: enhanced_images
                .get(s.product_id.as_str())
                .or_else(|| catalog_images.get(s.product_id.as_str()))
                .map(|url| (*url).to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;
    use crate::core::{ArtifactStatus, ContentKey, EnhancedImage, Payload, UgcScript};
    use pretty_assertions::assert_eq;

    fn product(id: &str, image: &str) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_uppercase(),
            image_url: image.to_string(),
            ..Default::default()
        }
    }

    fn platforms() -> PlatformsConfig {
        let enabled = |n| PlatformConfig {
            enabled: true,
            variations_per_product: n,
            ..Default::default()
        };
        PlatformsConfig::default()
            .with_platform("meta", enabled(2))
            .with_platform("google", enabled(2))
            .with_platform("tiktok", PlatformConfig::default())
    }

    fn script(product_id: &str, ugc_type: &str) -> Artifact {
        Artifact::new(
            ContentKey::derive(&[product_id, ugc_type]),
            product_id,
            product_id,
            ArtifactStatus::Generated,
            Payload::UgcScript(UgcScript {
                ugc_type: ugc_type.to_string(),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_ad_copy_items_cross_product() {
        let products = vec![product("a", ""), product("b", "")];
        let items = ad_copy_items(&products, &platforms(), &RunFilters::default());
        assert_eq!(items.len(), 8);

        let labels: Vec<_> = items.iter().take(4).map(WorkItem::label).collect();
        assert_eq!(labels, vec!["A google v1", "A google v2", "A meta v1", "A meta v2"]);
    }

    #[test]
    fn test_ad_copy_items_filtered() {
        let products = vec![product("a", ""), product("b", "")];
        let filters = RunFilters {
            product_id: Some("b".to_string()),
            platform: Some("meta".to_string()),
            ugc_type: None,
        };
        let items = ad_copy_items(&products, &platforms(), &filters);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.product_id() == "b"));
    }

    #[test]
    fn test_image_items_need_image() {
        let products = vec![product("a", "https://x/a.jpg"), product("b", "")];
        let items = image_items(&products, &RunFilters::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id(), "a");
    }

    #[test]
    fn test_ugc_script_items() {
        let products = vec![product("a", "")];
        assert_eq!(ugc_script_items(&products, &PlatformsConfig::default(), &RunFilters::default()).len(), 3);

        let filters = RunFilters {
            ugc_type: Some("review".to_string()),
            ..Default::default()
        };
        let items = ugc_script_items(&products, &PlatformsConfig::default(), &filters);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key(), ContentKey::derive(&["a", "review"]));
    }

    #[test]
    fn test_video_items_prefer_enhanced_image() {
        let products = vec![product("a", "https://x/a.jpg"), product("b", "https://x/b.jpg")];
        let enhanced_image = |id: &str, clean: Option<&str>| {
            Artifact::new(
                ContentKey::derive(&[id, "enhanced"]),
                id,
                id,
                ArtifactStatus::Generated,
                Payload::EnhancedImage(EnhancedImage {
                    source_url: format!("https://x/{id}.jpg"),
                    clean_image_url: clean.map(String::from),
                    scene_urls: vec![format!("https://x/{id}-scene.png")],
                }),
            )
        };
        let enhanced = vec![enhanced_image("a", Some("https://x/a-clean.png")), enhanced_image("b", None)];
        let scripts = vec![script("a", "review"), script("b", "unboxing"), script("c", "review")];

        let items = ugc_video_items(&scripts, &products, &enhanced, &RunFilters::default());
        let images: Vec<_> = items
            .iter()
            .map(|i| match i {
                WorkItem::UgcVideo { image_url, .. } => image_url.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            images,
            vec![
                Some("https://x/a-clean.png".to_string()),
                Some("https://x/b.jpg".to_string()),
                None
            ]
        );

        let filters = RunFilters {
            ugc_type: Some("review".to_string()),
            ..Default::default()
        };
        assert_eq!(ugc_video_items(&scripts, &products, &enhanced, &filters).len(), 2);
    }
}
