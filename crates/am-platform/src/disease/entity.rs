//! Disease detection record entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::tsid::TsidGenerator;

/// One plant-disease detection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    #[serde(rename = "_id")]
    pub id: String,
    /// Disease name as reported by the model or entered manually
    pub name: String,
    /// Risk assessment, e.g. "high" or "low"
    pub risk: String,
    /// Model confidence for this detection, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    /// User who ran the detection
    pub detect_by: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Disease {
    pub fn new(
        name: impl Into<String>,
        risk: impl Into<String>,
        detect_by: impl Into<String>,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            name: name.into(),
            risk: risk.into(),
            percentage: None,
            detect_by: detect_by.into(),
            created_at: Utc::now(),
        }
    }
}
