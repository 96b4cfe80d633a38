//! Product entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;

/// Catalog categories, stored capitalized on the wire ("Fertilizers")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProductCategory {
    Fertilizers,
    Tools,
    Seeds,
    Pesticides,
    Equipment,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// External product page, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// User who created this product
    pub created_by: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        category: ProductCategory,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            name: name.into(),
            description: description.into(),
            price,
            category,
            rating: 0.0,
            is_featured: false,
            image: None,
            link: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_values_are_capitalized() {
        assert_eq!(
            serde_json::to_string(&ProductCategory::Fertilizers).unwrap(),
            "\"Fertilizers\""
        );
        assert_eq!(
            serde_json::to_string(&ProductCategory::Equipment).unwrap(),
            "\"Equipment\""
        );
    }

    #[test]
    fn test_category_accepts_capitalized_input() {
        let category: ProductCategory = serde_json::from_str("\"Fertilizers\"").unwrap();
        assert_eq!(category, ProductCategory::Fertilizers);
        assert!(serde_json::from_str::<ProductCategory>("\"fertilizers\"").is_err());
    }

    #[test]
    fn test_new_product_defaults() {
        let p = Product::new(
            "Urea",
            "Nitrogen fertilizer",
            12.5,
            ProductCategory::Fertilizers,
            "user-1",
        );
        assert_eq!(p.rating, 0.0);
        assert!(!p.is_featured);
        assert!(p.image.is_none());
        assert_eq!(p.created_by, "user-1");
    }

    #[test]
    fn test_featured_field_name_on_wire() {
        let p = Product::new("Urea", "d", 1.0, ProductCategory::Fertilizers, "u");
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("isFeatured").is_some());
    }
}
