//! User management API endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use bson::doc;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::entity::{UserResponse, UserRole};
use super::repository::UserRepository;
use crate::shared::api_common::{ApiEnvelope, Paginated, PaginationParams};
use crate::shared::error::{AppError, ErrorEnvelope, Result};
use crate::shared::middleware::Authenticated;

#[derive(Clone)]
pub struct UserState {
    pub users: UserRepository,
}

pub fn router(state: UserState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(update_profile))
        .routes(routes!(get_users))
        .routes(routes!(update_user_role))
        .routes(routes!(count_users))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Translate a profile request into a `$set` document. Email changes are
/// normalized to lowercase; the unique index enforces uniqueness.
fn profile_changes(request: UpdateProfileRequest) -> Result<bson::Document> {
    let mut changes = doc! {};
    if let Some(first_name) = request.first_name {
        changes.insert("firstName", first_name);
    }
    if let Some(last_name) = request.last_name {
        changes.insert("lastName", last_name);
    }
    if let Some(email) = request.email {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AppError::validation("A valid email is required"));
        }
        changes.insert("email", email.trim().to_lowercase());
    }
    if let Some(phone) = request.phone {
        changes.insert("phone", phone);
    }
    if changes.is_empty() {
        return Err(AppError::validation("No profile fields to update"));
    }
    Ok(changes)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

/// Update the caller's own profile. Only provided fields change.
#[utoipa::path(
    put,
    path = "/updateProfile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiEnvelope<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope),
    ),
    tag = "user"
)]
async fn update_profile(
    State(state): State<UserState>,
    auth: Authenticated,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiEnvelope<UserResponse>>> {
    let changes = profile_changes(request)?;
    let user = state.users.update_profile(&auth.user_id, changes).await?;
    Ok(Json(ApiEnvelope::ok(
        UserResponse::from(user),
        "Profile updated",
    )))
}

/// List all users, newest first (admin only)
#[utoipa::path(
    get,
    path = "/getUsers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users", body = ApiEnvelope<Paginated<UserResponse>>),
        (status = 403, description = "Admin access required", body = ErrorEnvelope),
    ),
    tag = "user"
)]
async fn get_users(
    State(state): State<UserState>,
    auth: Authenticated,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiEnvelope<Paginated<UserResponse>>>> {
    auth.require_admin()?;

    let total = state.users.count().await?;
    let users = state.users.list(params.skip(), params.limit()).await?;
    let docs = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(docs, total, params.page(), params.limit()),
        "Users fetched",
    )))
}

/// Change a user's role (admin only)
#[utoipa::path(
    put,
    path = "/updateUserRole/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ApiEnvelope<UserResponse>),
        (status = 403, description = "Admin access required", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope),
    ),
    tag = "user"
)]
async fn update_user_role(
    State(state): State<UserState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<ApiEnvelope<UserResponse>>> {
    auth.require_admin()?;

    let user = state.users.set_role(&id, request.role).await?;
    Ok(Json(ApiEnvelope::ok(
        UserResponse::from(user),
        "User role updated",
    )))
}

/// Total number of registered users
#[utoipa::path(
    get,
    path = "/count",
    responses(
        (status = 200, description = "User count", body = ApiEnvelope<CountResponse>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "user"
)]
async fn count_users(
    State(state): State<UserState>,
    _auth: Authenticated,
) -> Result<Json<ApiEnvelope<CountResponse>>> {
    let count = state.users.count().await?;
    Ok(Json(ApiEnvelope::ok(CountResponse { count }, "User count")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_changes_normalizes_email() {
        let changes = profile_changes(UpdateProfileRequest {
            email: Some("  Asha@Example.COM ".to_string()),
            phone: Some("0771234567".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.get_str("email").unwrap(), "asha@example.com");
        assert_eq!(changes.get_str("phone").unwrap(), "0771234567");
    }

    #[test]
    fn test_profile_changes_rejects_bad_email() {
        let err = profile_changes(UpdateProfileRequest {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_profile_changes_rejects_empty_request() {
        assert!(profile_changes(UpdateProfileRequest::default()).is_err());
    }
}
