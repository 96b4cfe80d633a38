//! Catalog listing filters
//!
//! Turns the query string of the product listing endpoint into a
//! MongoDB filter and sort. Kept separate from the handlers so the
//! translation is testable without a database.

use bson::{doc, Document};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::shared::api_common::string_or_number;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Exact category match
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_number::deserialize_f64_opt")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "string_or_number::deserialize_f64_opt")]
    pub max_price: Option<f64>,
    /// Minimum rating (inclusive)
    #[serde(default, deserialize_with = "string_or_number::deserialize_f64_opt")]
    pub min_rating: Option<f64>,
    /// Only the literal string "true" narrows to featured products
    pub featured: Option<String>,
    /// Case-insensitive substring match on name or description
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl ProductQuery {
    pub fn filter(&self) -> Document {
        let mut filter = doc! {};

        if let Some(category) = &self.category {
            filter.insert("category", category);
        }

        let mut price = doc! {};
        if let Some(min) = self.min_price {
            price.insert("$gte", min);
        }
        if let Some(max) = self.max_price {
            price.insert("$lte", max);
        }
        if !price.is_empty() {
            filter.insert("price", price);
        }

        if let Some(rating) = self.min_rating {
            filter.insert("rating", doc! { "$gte": rating });
        }

        if self.featured.as_deref() == Some("true") {
            filter.insert("isFeatured", true);
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = regex_escape(search.trim());
            filter.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": &pattern, "$options": "i" } },
                    doc! { "description": { "$regex": &pattern, "$options": "i" } },
                ],
            );
        }

        filter
    }

    pub fn sort(&self) -> Document {
        match self.sort.as_deref() {
            Some("price_asc") => doc! { "price": 1 },
            Some("price_desc") => doc! { "price": -1 },
            Some("rating_desc") => doc! { "rating": -1 },
            // "newest" and anything unrecognized
            _ => doc! { "createdAt": -1 },
        }
    }
}

/// Escape regex metacharacters so user input matches literally
fn regex_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if ".^$*+?()[]{}|\\".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_matches_everything() {
        let q = ProductQuery::default();
        assert_eq!(q.filter(), doc! {});
        assert_eq!(q.sort(), doc! { "createdAt": -1 });
    }

    #[test]
    fn test_price_range() {
        let q = ProductQuery {
            min_price: Some(10.0),
            max_price: Some(50.0),
            ..Default::default()
        };
        assert_eq!(q.filter(), doc! { "price": { "$gte": 10.0, "$lte": 50.0 } });
    }

    #[test]
    fn test_half_open_price_range() {
        let q = ProductQuery {
            min_price: Some(10.0),
            ..Default::default()
        };
        assert_eq!(q.filter(), doc! { "price": { "$gte": 10.0 } });
    }

    #[test]
    fn test_featured_requires_literal_true() {
        let q = ProductQuery {
            featured: Some("true".to_string()),
            ..Default::default()
        };
        assert_eq!(q.filter(), doc! { "isFeatured": true });

        let q = ProductQuery {
            featured: Some("yes".to_string()),
            ..Default::default()
        };
        assert_eq!(q.filter(), doc! {});
    }

    #[test]
    fn test_search_builds_or_regex() {
        let q = ProductQuery {
            search: Some("urea".to_string()),
            ..Default::default()
        };
        let filter = q.filter();
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
        let name = or[0].as_document().unwrap();
        assert_eq!(
            name.get_document("name").unwrap().get_str("$options").unwrap(),
            "i"
        );
    }

    #[test]
    fn test_search_escapes_metacharacters() {
        let q = ProductQuery {
            search: Some("n.p.k (20-20)".to_string()),
            ..Default::default()
        };
        let filter = q.filter();
        let or = filter.get_array("$or").unwrap();
        let pattern = or[0]
            .as_document()
            .unwrap()
            .get_document("name")
            .unwrap()
            .get_str("$regex")
            .unwrap();
        assert_eq!(pattern, "n\\.p\\.k \\(20-20\\)");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let q = ProductQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(q.filter(), doc! {});
    }

    #[test]
    fn test_sort_map() {
        let sort_of = |s: &str| ProductQuery {
            sort: Some(s.to_string()),
            ..Default::default()
        }
        .sort();
        assert_eq!(sort_of("price_asc"), doc! { "price": 1 });
        assert_eq!(sort_of("price_desc"), doc! { "price": -1 });
        assert_eq!(sort_of("rating_desc"), doc! { "rating": -1 });
        assert_eq!(sort_of("newest"), doc! { "createdAt": -1 });
        assert_eq!(sort_of("bogus"), doc! { "createdAt": -1 });
    }

    #[test]
    fn test_combined_filters() {
        let q = ProductQuery {
            category: Some("Seeds".to_string()),
            min_rating: Some(4.0),
            featured: Some("true".to_string()),
            ..Default::default()
        };
        let filter = q.filter();
        assert_eq!(filter.get_str("category").unwrap(), "Seeds");
        assert_eq!(filter.get_document("rating").unwrap().get_f64("$gte").unwrap(), 4.0);
        assert_eq!(filter.get_bool("isFeatured").unwrap(), true);
    }
}
