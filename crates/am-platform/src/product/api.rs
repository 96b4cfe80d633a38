//! Product catalog API endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bson::doc;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::entity::{Product, ProductCategory};
use super::query::ProductQuery;
use super::repository::ProductRepository;
use crate::shared::api_common::{ApiEnvelope, Paginated, PaginationParams};
use crate::shared::error::{AppError, ErrorEnvelope, Result};
use crate::shared::media_store::{decode_base64_image, MediaStore};
use crate::shared::middleware::Authenticated;

#[derive(Clone)]
pub struct ProductState {
    pub products: ProductRepository,
    pub media: Arc<dyn MediaStore>,
}

pub fn router(state: ProductState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_product))
        .routes(routes!(get_products))
        .routes(routes!(get_product))
        .routes(routes!(update_product))
        .routes(routes!(delete_product))
        .routes(routes!(count_products))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub link: Option<String>,
    /// Base64-encoded image payload, optionally a data URL
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<ProductCategory>,
    pub rating: Option<f64>,
    pub is_featured: Option<bool>,
    pub link: Option<String>,
    /// Replacement image as base64; the previous image is deleted first
    pub image: Option<String>,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

/// Delete the stored image for a product, if it has one
pub async fn remove_product_image(media: &Arc<dyn MediaStore>, product: &Product) -> Result<()> {
    if let Some(image) = &product.image {
        media.delete(image).await?;
    }
    Ok(())
}

async fn store_image(
    media: &Arc<dyn MediaStore>,
    product_id: &str,
    payload: &str,
) -> Result<String> {
    let bytes = decode_base64_image(payload)?;
    media.upload(bytes, &format!("product-{product_id}.jpg")).await
}

/// Create a product
#[utoipa::path(
    post,
    path = "/createProduct",
    request_body = AddProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiEnvelope<Product>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "product"
)]
async fn create_product(
    State(state): State<ProductState>,
    auth: Authenticated,
    Json(request): Json<AddProductRequest>,
) -> Result<Response> {
    if request.name.trim().is_empty() {
        return Err(AppError::validation("Product name is required"));
    }
    if request.price < 0.0 {
        return Err(AppError::validation("Price must not be negative"));
    }

    let mut product = Product::new(
        request.name.trim(),
        request.description,
        request.price,
        request.category,
        &auth.user_id,
    );
    if let Some(rating) = request.rating {
        product.rating = rating.clamp(0.0, 5.0);
    }
    if let Some(is_featured) = request.is_featured {
        product.is_featured = is_featured;
    }
    product.link = request.link;
    if let Some(payload) = &request.image {
        product.image = Some(store_image(&state.media, &product.id, payload).await?);
    }

    state.products.insert(&product).await?;
    tracing::info!(product_id = %product.id, "product created");

    let body = ApiEnvelope::created(product, "Product created");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// List products with filtering, sorting, and pagination
#[utoipa::path(
    get,
    path = "/getProducts",
    params(ProductQuery, PaginationParams),
    responses(
        (status = 200, description = "Page of products", body = ApiEnvelope<Paginated<Product>>),
    ),
    tag = "product"
)]
async fn get_products(
    State(state): State<ProductState>,
    Query(query): Query<ProductQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiEnvelope<Paginated<Product>>>> {
    let filter = query.filter();
    let total = state.products.count_matching(filter.clone()).await?;
    let docs = state
        .products
        .list(filter, query.sort(), params.skip(), params.limit())
        .await?;

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(docs, total, params.page(), params.limit()),
        "Products fetched",
    )))
}

/// Fetch a single product
#[utoipa::path(
    get,
    path = "/getProduct/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ApiEnvelope<Product>),
        (status = 404, description = "Product not found", body = ErrorEnvelope),
    ),
    tag = "product"
)]
async fn get_product(
    State(state): State<ProductState>,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<Product>>> {
    let product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    Ok(Json(ApiEnvelope::ok(product, "Product fetched")))
}

/// Update a product. A replacement image deletes the old stored object
/// before the new one is uploaded.
#[utoipa::path(
    put,
    path = "/updateProduct/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiEnvelope<Product>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "Product not found", body = ErrorEnvelope),
    ),
    tag = "product"
)]
async fn update_product(
    State(state): State<ProductState>,
    _auth: Authenticated,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ApiEnvelope<Product>>> {
    let existing = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let mut changes = doc! {};
    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("Product name must not be empty"));
        }
        changes.insert("name", name.trim());
    }
    if let Some(description) = request.description {
        changes.insert("description", description);
    }
    if let Some(price) = request.price {
        if price < 0.0 {
            return Err(AppError::validation("Price must not be negative"));
        }
        changes.insert("price", price);
    }
    if let Some(category) = request.category {
        changes.insert("category", bson::to_bson(&category)?);
    }
    if let Some(rating) = request.rating {
        changes.insert("rating", rating.clamp(0.0, 5.0));
    }
    if let Some(is_featured) = request.is_featured {
        changes.insert("isFeatured", is_featured);
    }
    if let Some(link) = request.link {
        changes.insert("link", link);
    }
    if let Some(payload) = &request.image {
        if let Some(old) = &existing.image {
            state.media.delete(old).await?;
        }
        let url = store_image(&state.media, &id, payload).await?;
        changes.insert("image", url);
    }

    if changes.is_empty() {
        return Err(AppError::validation("No product fields to update"));
    }

    let product = state.products.update(&id, changes).await?;
    Ok(Json(ApiEnvelope::ok(product, "Product updated")))
}

/// Delete a product and its stored image
#[utoipa::path(
    delete,
    path = "/deleteProduct/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = ApiEnvelope<Product>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "Product not found", body = ErrorEnvelope),
    ),
    tag = "product"
)]
async fn delete_product(
    State(state): State<ProductState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<Product>>> {
    let product = state.products.delete(&id).await?;
    remove_product_image(&state.media, &product).await?;
    tracing::info!(product_id = %product.id, "product deleted");

    Ok(Json(ApiEnvelope::ok(product, "Product deleted")))
}

/// Total number of products
#[utoipa::path(
    get,
    path = "/count",
    responses(
        (status = 200, description = "Product count", body = ApiEnvelope<CountResponse>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "product"
)]
async fn count_products(
    State(state): State<ProductState>,
    _auth: Authenticated,
) -> Result<Json<ApiEnvelope<CountResponse>>> {
    let count = state.products.count().await?;
    Ok(Json(ApiEnvelope::ok(CountResponse { count }, "Product count")))
}
