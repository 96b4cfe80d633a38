//! Common API types and utilities

use utoipa::{ToSchema, IntoParams};
use serde::{Deserialize, Serialize};

pub mod string_or_number {
    use serde::{Deserialize, Deserializer, de};

    pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(u32),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) => s.parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }

    pub fn deserialize_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(f64),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) => s.parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Success response envelope: `{status, success: true, data, message}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: 200,
            success: true,
            data,
            message: message.into(),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: 201,
            success: true,
            data,
            message: message.into(),
        }
    }
}

/// Hard cap on page size; the store should never be asked for unbounded result sets.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination parameters (1-based `page`, `limit` per page)
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    page: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    limit: Option<u32>,
}

impl PaginationParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn skip(&self) -> u64 {
        ((self.page() - 1) as u64) * (self.limit() as u64)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            limit: Some(10),
        }
    }
}

/// Pagination metadata returned alongside a page of results
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_docs: u64,
    pub limit: u32,
    pub total_pages: u32,
    pub page: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl PageMeta {
    pub fn new(total_docs: u64, page: u32, limit: u32) -> Self {
        let total_pages = ((total_docs as f64) / (limit as f64)).ceil().max(1.0) as u32;
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;
        Self {
            total_docs,
            limit,
            total_pages,
            page,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}

/// A page of results plus its metadata
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub docs: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, page: u32, limit: u32) -> Self {
        Self {
            docs,
            pagination: PageMeta::new(total_docs, page, limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.skip(), 0);
    }

    #[test]
    fn test_pagination_accepts_strings() {
        // Query strings arrive as strings; both forms must parse
        let params: PaginationParams = serde_json::from_str(r#"{"page":"3","limit":"25"}"#).unwrap();
        assert_eq!(params.page(), 3);
        assert_eq!(params.limit(), 25);
        assert_eq!(params.skip(), 50);
    }

    #[test]
    fn test_limit_is_clamped() {
        let params: PaginationParams = serde_json::from_str(r#"{"limit":100000}"#).unwrap();
        assert_eq!(params.limit(), MAX_PAGE_SIZE);

        let params: PaginationParams = serde_json::from_str(r#"{"limit":0}"#).unwrap();
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn test_page_meta_edges() {
        let meta = PageMeta::new(0, 1, 10);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_prev_page);
        assert!(!meta.has_next_page);
        assert_eq!(meta.prev_page, None);
        assert_eq!(meta.next_page, None);

        let meta = PageMeta::new(35, 2, 10);
        assert_eq!(meta.total_pages, 4);
        assert!(meta.has_prev_page);
        assert!(meta.has_next_page);
        assert_eq!(meta.prev_page, Some(1));
        assert_eq!(meta.next_page, Some(3));
    }

    #[test]
    fn test_envelope_shape() {
        let env = ApiEnvelope::ok(serde_json::json!({"x": 1}), "done");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["status"], 200);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["x"], 1);
        assert_eq!(json["message"], "done");
    }
}
