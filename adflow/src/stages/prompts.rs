//! Structured briefs for the text generator.
//!
//! Briefs are JSON documents; the generator is told to answer with JSON
//! only. Wording is deliberately short: copywriting quality is the
//! generator's concern.

use serde_json::{json, Value};

use crate::collaborators::TextRequest;
use crate::config::{BrandConfig, PlatformConfig};
use crate::core::Product;

/// Creative angles, rotated by variation number.
pub const AD_ANGLES: [&str; 6] = [
    "benefit-focused: lead with what the customer gains",
    "problem-solution: name the pain, offer the fix",
    "social-proof: imply popularity or trust",
    "urgency: limited time, scarcity",
    "curiosity: tease a result without revealing everything",
    "lifestyle: paint a picture of life with this product",
];

/// Returns the angle for a 1-based variation number.
#[must_use]
pub fn ad_angle(variation: u32) -> &'static str {
    let index = (variation.max(1) - 1) as usize % AD_ANGLES.len();
    AD_ANGLES[index]
}

fn platform_fields(platform: &str) -> Vec<(&'static str, u32)> {
    match platform {
        "meta" => vec![("headline", 40), ("primary_text", 125), ("description", 30), ("cta", 20)],
        "google" => vec![("headline", 30), ("description_line_1", 90), ("description_line_2", 90)],
        "tiktok" => vec![("ad_text", 100), ("caption", 150), ("cta", 20)],
        "pinterest" => vec![("title", 100), ("description", 500), ("cta", 20)],
        _ => vec![("headline", 40), ("description", 125), ("cta", 20)],
    }
}

fn brand_json(brand: &BrandConfig) -> Value {
    json!({
        "name": brand.business_name,
        "tone": brand.tone_description(),
        "usp": brand.usp,
        "target_audience": brand.target_audience,
        "competitors": brand.competitors,
        "words_to_avoid": brand.words_to_avoid,
    })
}

fn product_json(product: &Product) -> Value {
    json!({
        "name": product.name,
        "price": product.price,
        "category": product.category,
        "description": product.description,
    })
}

/// Brief for one ad variation.
#[must_use]
pub fn ad_copy_request(
    brand: &BrandConfig,
    product: &Product,
    platform: &str,
    platform_config: Option<&PlatformConfig>,
    variation: u32,
) -> TextRequest {
    let fields: serde_json::Map<String, Value> = platform_fields(platform)
        .into_iter()
        .map(|(field, default_limit)| {
            let limit = platform_config
                .and_then(|c| c.char_limits.get(field).copied())
                .unwrap_or(default_limit);
            (field.to_string(), json!({ "max_chars": limit }))
        })
        .collect();

    let brief = json!({
        "task": "Write ONE ad variation.",
        "brand": brand_json(brand),
        "product": product_json(product),
        "platform": platform,
        "fields": fields,
        "angle": ad_angle(variation),
        "variation": variation,
        "rules": [
            "Respect every character limit.",
            "Never use a word from words_to_avoid.",
            "Match the brand tone.",
            "Make this variation distinct from the others."
        ],
        "output": "A JSON object with exactly the listed fields."
    });

    TextRequest::new(
        "You are an expert PPC ad copywriter. Always return valid JSON only.",
        brief.to_string(),
    )
}

/// Brief for one UGC script.
#[must_use]
pub fn ugc_script_request(brand: &BrandConfig, product: &Product, ugc_type: &str) -> TextRequest {
    let brief = json!({
        "task": "Write a short UGC video script in the voice of a real customer.",
        "brand": brand_json(brand),
        "product": product_json(product),
        "ugc_type": ugc_type,
        "length_seconds": { "min": 15, "max": 60 },
        "output": {
            "hook": "opening line, first 3 seconds",
            "scenes": [{ "dialogue": "spoken line", "visual": "shot description", "duration_seconds": 5 }],
            "cta": "closing call to action",
            "total_duration_seconds": 30,
            "music_suggestion": "background music mood"
        }
    });

    TextRequest::new(
        "You write authentic user-generated-content video scripts. Always return valid JSON only.",
        brief.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn product() -> Product {
        Product {
            id: "p1".to_string(),
            name: "Linen Throw".to_string(),
            price: "$49".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_angles_rotate() {
        assert_eq!(ad_angle(1), AD_ANGLES[0]);
        assert_eq!(ad_angle(6), AD_ANGLES[5]);
        assert_eq!(ad_angle(7), AD_ANGLES[0]);
        assert_eq!(ad_angle(0), AD_ANGLES[0]);
    }

    #[test]
    fn test_ad_brief_uses_char_limits() {
        let config = PlatformConfig {
            enabled: true,
            variations_per_product: 2,
            char_limits: BTreeMap::from([("headline".to_string(), 25)]),
        };
        let request = ad_copy_request(&BrandConfig::default(), &product(), "meta", Some(&config), 2);
        let brief: Value = serde_json::from_str(&request.prompt).unwrap();
        assert_eq!(brief["fields"]["headline"]["max_chars"], 25);
        assert_eq!(brief["fields"]["primary_text"]["max_chars"], 125);
        assert_eq!(brief["angle"], AD_ANGLES[1]);
        assert_eq!(brief["product"]["name"], "Linen Throw");
    }

    #[test]
    fn test_script_brief() {
        let request = ugc_script_request(&BrandConfig::default(), &product(), "unboxing");
        let brief: Value = serde_json::from_str(&request.prompt).unwrap();
        assert_eq!(brief["ugc_type"], "unboxing");
        assert!(request.system.contains("JSON"));
    }
}
