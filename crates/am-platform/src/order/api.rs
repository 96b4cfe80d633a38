//! Order API endpoints
//!
//! Mounted under the product router alongside the catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::analytics::{build_sales_data, MonthSales};
use super::entity::{Order, OrderWithProduct};
use super::repository::OrderRepository;
use crate::product::repository::ProductRepository;
use crate::shared::api_common::{string_or_number, ApiEnvelope, Paginated, PaginationParams};
use crate::shared::error::{AppError, ErrorEnvelope, Result};
use crate::shared::middleware::Authenticated;

#[derive(Clone)]
pub struct OrderState {
    pub orders: OrderRepository,
    pub products: ProductRepository,
}

pub fn router(state: OrderState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(add_order))
        .routes(routes!(get_orders))
        .routes(routes!(order_analytics))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsParams {
    /// Calendar year, defaults to the current year
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub year: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderAnalyticsResponse {
    pub year: i32,
    pub sales_data: Vec<MonthSales>,
    pub total_orders: u64,
    pub total_products: u64,
    pub recent_orders: Vec<OrderWithProduct>,
}

/// Record an order for a product by the authenticated user
#[utoipa::path(
    post,
    path = "/addOrder/{prodId}",
    params(("prodId" = String, Path, description = "Product id")),
    responses(
        (status = 201, description = "Order recorded", body = ApiEnvelope<Order>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "Product not found", body = ErrorEnvelope),
    ),
    tag = "order"
)]
async fn add_order(
    State(state): State<OrderState>,
    auth: Authenticated,
    Path(prod_id): Path<String>,
) -> Result<Response> {
    let product = state
        .products
        .find_by_id(&prod_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let order = Order::new(&auth.user_id, &product.id);
    state.orders.insert(&order).await?;
    tracing::info!(order_id = %order.id, product_id = %product.id, "order recorded");

    let body = ApiEnvelope::created(order, "Order recorded");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// List orders, newest first, joined with their products
#[utoipa::path(
    get,
    path = "/getOrders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of orders", body = ApiEnvelope<Paginated<OrderWithProduct>>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "order"
)]
async fn get_orders(
    State(state): State<OrderState>,
    _auth: Authenticated,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiEnvelope<Paginated<OrderWithProduct>>>> {
    let total = state.orders.count().await?;
    let docs = state
        .orders
        .list_with_products(params.skip(), params.limit())
        .await?;

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(docs, total, params.page(), params.limit()),
        "Orders fetched",
    )))
}

/// Sales dashboard: totals, recent orders, and the monthly series.
/// For the current year the series runs January through the current
/// month; past years get all twelve months.
#[utoipa::path(
    get,
    path = "/orderAnalytics",
    params(AnalyticsParams),
    responses(
        (status = 200, description = "Monthly sales series", body = ApiEnvelope<OrderAnalyticsResponse>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "order"
)]
async fn order_analytics(
    State(state): State<OrderState>,
    _auth: Authenticated,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<ApiEnvelope<OrderAnalyticsResponse>>> {
    let now = Utc::now();
    let year = params.year.map(|y| y as i32).unwrap_or_else(|| now.year());
    let through_month = if year == now.year() { now.month() } else { 12 };

    let rows = state.orders.monthly_sales(year).await?;
    let sales_data = build_sales_data(&rows, through_month);
    let total_orders = state.orders.count().await?;
    let total_products = state.products.count().await?;
    let recent_orders = state.orders.list_with_products(0, 5).await?;

    Ok(Json(ApiEnvelope::ok(
        OrderAnalyticsResponse {
            year,
            sales_data,
            total_orders,
            total_products,
            recent_orders,
        },
        "Order analytics",
    )))
}
