//! Product catalog records.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::ContentKey;

/// A product as delivered by a feed, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Display name; required.
    #[serde(default)]
    pub name: String,
    /// Stock keeping unit, part of the product identity. Numbers are kept as written.
    #[serde(default, deserialize_with = "string_or_number")]
    pub sku: String,
    /// Price as shown on the storefront. Numbers are kept as written.
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,
    /// Category.
    #[serde(default)]
    pub category: String,
    /// Marketing description.
    #[serde(default)]
    pub description: String,
    /// Main product image.
    #[serde(default)]
    pub image_url: String,
    /// Product page.
    #[serde(default)]
    pub url: String,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(D::Error::custom(format!("expected a string or a number, found {other}"))),
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Product {
    /// Stable id derived from name and sku.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: String,
    /// Price as shown on the storefront.
    #[serde(default)]
    pub price: String,
    /// Category.
    #[serde(default)]
    pub category: String,
    /// Marketing description.
    #[serde(default)]
    pub description: String,
    /// Main product image.
    #[serde(default)]
    pub image_url: String,
    /// Product page.
    #[serde(default)]
    pub url: String,
}

impl Product {
    /// Derives the catalog id for a name and sku pair.
    #[must_use]
    pub fn derive_id(name: &str, sku: &str) -> String {
        ContentKey::derive(&[name, sku]).to_string()
    }

    /// Builds a catalog product from a feed record.
    ///
    /// Returns `None` when the record has no usable name.
    #[must_use]
    pub fn from_record(record: ProductRecord) -> Option<Self> {
        let name = record.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: Self::derive_id(&name, &record.sku),
            name,
            sku: record.sku.trim().to_string(),
            price: record.price,
            category: record.category,
            description: record.description,
            image_url: record.image_url.trim().to_string(),
            url: record.url,
        })
    }

    /// Returns the image URL if one is set.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        Some(self.image_url.as_str()).filter(|u| !u.is_empty())
    }
}
