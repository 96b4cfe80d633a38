//! Contact message API endpoints
//!
//! Submitting and reading a single message are public; the inbox
//! listing requires authentication.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::entity::Message;
use super::repository::MessageRepository;
use crate::shared::api_common::{ApiEnvelope, Paginated, PaginationParams};
use crate::shared::error::{AppError, ErrorEnvelope, Result};
use crate::shared::middleware::Authenticated;

#[derive(Clone)]
pub struct MessageState {
    pub messages: MessageRepository,
}

pub fn router(state: MessageState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(add_message))
        .routes(routes!(get_message))
        .routes(routes!(get_all_messages))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMessageRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Submit a contact message
#[utoipa::path(
    post,
    path = "/addMessage",
    request_body = AddMessageRequest,
    responses(
        (status = 201, description = "Message received", body = ApiEnvelope<Message>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
    ),
    tag = "message"
)]
async fn add_message(
    State(state): State<MessageState>,
    Json(request): Json<AddMessageRequest>,
) -> Result<Response> {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.subject.trim().is_empty()
        || request.message.trim().is_empty()
    {
        return Err(AppError::validation(
            "Name, email, subject, and message are required",
        ));
    }

    let message = Message::new(
        request.name.trim(),
        request.email.trim(),
        request.subject.trim(),
        request.message.trim(),
    );
    state.messages.insert(&message).await?;
    tracing::info!(message_id = %message.id, "contact message received");

    let body = ApiEnvelope::created(message, "Message received");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Fetch a single message
#[utoipa::path(
    get,
    path = "/getMessage/{id}",
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "The message", body = ApiEnvelope<Message>),
        (status = 404, description = "Message not found", body = ErrorEnvelope),
    ),
    tag = "message"
)]
async fn get_message(
    State(state): State<MessageState>,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<Message>>> {
    let message = state
        .messages
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Message"))?;
    Ok(Json(ApiEnvelope::ok(message, "Message fetched")))
}

/// List all messages, newest first
#[utoipa::path(
    get,
    path = "/getAllMessages",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of messages", body = ApiEnvelope<Paginated<Message>>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "message"
)]
async fn get_all_messages(
    State(state): State<MessageState>,
    _auth: Authenticated,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiEnvelope<Paginated<Message>>>> {
    let total = state.messages.count().await?;
    let docs = state.messages.list(params.skip(), params.limit()).await?;

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(docs, total, params.page(), params.limit()),
        "Messages fetched",
    )))
}
