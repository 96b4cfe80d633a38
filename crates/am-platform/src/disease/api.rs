//! Disease detection API endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::analytics::{build_breakdown, BreakdownPolicy, DiseaseSlice};
use super::entity::Disease;
use super::predictor::{DiseasePredictor, Prediction};
use super::repository::DiseaseRepository;
use crate::shared::api_common::{ApiEnvelope, Paginated, PaginationParams};
use crate::shared::error::{AppError, ErrorEnvelope, Result};
use crate::shared::middleware::Authenticated;

#[derive(Clone)]
pub struct DiseaseState {
    pub diseases: DiseaseRepository,
    pub predictor: Arc<DiseasePredictor>,
    pub breakdown_policy: BreakdownPolicy,
}

pub fn router(state: DiseaseState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(add_disease))
        .routes(routes!(predict))
        .routes(routes!(get_recent))
        .routes(routes!(get_all_diseases))
        .routes(routes!(disease_analytics))
        .routes(routes!(count_diseases))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddDiseaseRequest {
    pub name: String,
    pub risk: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    /// Base64-encoded plant image
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub prediction: Prediction,
    pub record: Disease,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseAnalyticsResponse {
    pub total_detections: u64,
    pub breakdown: Vec<DiseaseSlice>,
    pub recent: Vec<Disease>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

/// Record a detection manually
#[utoipa::path(
    post,
    path = "/addDisease",
    request_body = AddDiseaseRequest,
    responses(
        (status = 201, description = "Detection recorded", body = ApiEnvelope<Disease>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "disease"
)]
async fn add_disease(
    State(state): State<DiseaseState>,
    auth: Authenticated,
    Json(request): Json<AddDiseaseRequest>,
) -> Result<Response> {
    if request.name.trim().is_empty() || request.risk.trim().is_empty() {
        return Err(AppError::validation("Disease name and risk are required"));
    }

    let disease = Disease::new(request.name.trim(), request.risk.trim(), &auth.user_id);

    state.diseases.insert(&disease).await?;
    tracing::info!(disease_id = %disease.id, name = %disease.name, "detection recorded");

    let body = ApiEnvelope::created(disease, "Detection recorded");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Run the prediction model on an image and record the result
#[utoipa::path(
    post,
    path = "/predict",
    request_body = PredictRequest,
    responses(
        (status = 201, description = "Prediction recorded", body = ApiEnvelope<PredictResponse>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 500, description = "Prediction service unavailable", body = ErrorEnvelope),
    ),
    tag = "disease"
)]
async fn predict(
    State(state): State<DiseaseState>,
    auth: Authenticated,
    Json(request): Json<PredictRequest>,
) -> Result<Response> {
    if request.image.trim().is_empty() {
        return Err(AppError::validation("An image is required"));
    }

    let prediction = state.predictor.predict(&request.image).await?;

    let mut disease = Disease::new(
        &prediction.name,
        prediction.risk.as_deref().unwrap_or("unknown"),
        &auth.user_id,
    );
    disease.percentage = prediction.confidence.map(|c| c * 100.0);
    state.diseases.insert(&disease).await?;
    tracing::info!(disease_id = %disease.id, name = %disease.name, "prediction recorded");

    let body = ApiEnvelope::created(
        PredictResponse {
            prediction,
            record: disease,
        },
        "Prediction recorded",
    );
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// The five most recent detections
#[utoipa::path(
    get,
    path = "/getRecent",
    responses(
        (status = 200, description = "Recent detections", body = ApiEnvelope<Vec<Disease>>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "disease"
)]
async fn get_recent(
    State(state): State<DiseaseState>,
    _auth: Authenticated,
) -> Result<Json<ApiEnvelope<Vec<Disease>>>> {
    let recent = state.diseases.recent(5).await?;
    Ok(Json(ApiEnvelope::ok(recent, "Recent detections")))
}

/// All detections, newest first
#[utoipa::path(
    get,
    path = "/getAllDiseases",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of detections", body = ApiEnvelope<Paginated<Disease>>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "disease"
)]
async fn get_all_diseases(
    State(state): State<DiseaseState>,
    _auth: Authenticated,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiEnvelope<Paginated<Disease>>>> {
    let total = state.diseases.count().await?;
    let docs = state.diseases.list(params.skip(), params.limit()).await?;

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(docs, total, params.page(), params.limit()),
        "Detections fetched",
    )))
}

/// Detection breakdown for the dashboard
#[utoipa::path(
    get,
    path = "/diseaseAnalytics",
    responses(
        (status = 200, description = "Detection breakdown", body = ApiEnvelope<DiseaseAnalyticsResponse>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "disease"
)]
async fn disease_analytics(
    State(state): State<DiseaseState>,
    _auth: Authenticated,
) -> Result<Json<ApiEnvelope<DiseaseAnalyticsResponse>>> {
    let rows = state.diseases.name_counts().await?;
    let breakdown = build_breakdown(&rows, state.breakdown_policy);
    let total_detections = state.diseases.count().await?;
    let recent = state.diseases.recent(5).await?;

    Ok(Json(ApiEnvelope::ok(
        DiseaseAnalyticsResponse {
            total_detections,
            breakdown,
            recent,
        },
        "Disease analytics",
    )))
}

/// Total number of detections
#[utoipa::path(
    get,
    path = "/count",
    responses(
        (status = 200, description = "Detection count", body = ApiEnvelope<CountResponse>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "disease"
)]
async fn count_diseases(
    State(state): State<DiseaseState>,
    _auth: Authenticated,
) -> Result<Json<ApiEnvelope<CountResponse>>> {
    let count = state.diseases.count().await?;
    Ok(Json(ApiEnvelope::ok(CountResponse { count }, "Detection count")))
}
