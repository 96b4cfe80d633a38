//! Authentication API endpoints
//!
//! Local register/login plus Google sign-in. Tokens travel both in the
//! response body (access token) and as httpOnly cookies so browser and
//! mobile clients can pick whichever fits.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::auth_service::{ensure_current, AuthService, TokenPair};
use super::google::{classify_federation, random_password, Federation, GoogleOAuthService};
use super::password_service::PasswordService;
use crate::shared::api_common::ApiEnvelope;
use crate::shared::error::{AppError, ErrorEnvelope, Result};
use crate::shared::middleware::{
    Authenticated, OptionalAuth, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::shared::tsid::TsidGenerator;
use crate::user::entity::{User, UserResponse};
use crate::user::repository::UserRepository;

#[derive(Clone)]
pub struct AuthState {
    pub users: UserRepository,
    pub auth: Arc<AuthService>,
    pub passwords: Arc<PasswordService>,
    pub google: Arc<GoogleOAuthService>,
}

pub fn router(state: AuthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(logout))
        .routes(routes!(recreate_access_token))
        .routes(routes!(google_redirect))
        .routes(routes!(google_callback))
        .routes(routes!(google_status))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh requests may carry the token in the body instead of the cookie
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

fn auth_cookies(jar: CookieJar, pair: &TokenPair, access_ttl: i64, refresh_ttl: i64) -> CookieJar {
    let access = Cookie::build((ACCESS_TOKEN_COOKIE, pair.access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(access_ttl))
        .build();
    let refresh = Cookie::build((REFRESH_TOKEN_COOKIE, pair.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(refresh_ttl))
        .build();
    jar.add(access).add(refresh)
}

fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").build())
        .remove(Cookie::build((REFRESH_TOKEN_COOKIE, "")).path("/").build())
}

fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(AppError::validation("A valid email is required"));
    }
    if request
        .phone
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .is_empty()
    {
        return Err(AppError::validation("A phone number is required"));
    }
    if request.password != request.confirm_password {
        return Err(AppError::validation("Passwords do not match"));
    }
    Ok(())
}

/// Pick the refresh token from the cookie, falling back to the body
fn refresh_token_from(cookie: Option<String>, body: Option<RefreshTokenRequest>) -> Result<String> {
    cookie
        .or(body.and_then(|b| b.refresh_token))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Missing refresh token"))
}

/// Register a new account with email and password
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiEnvelope<UserResponse>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 409, description = "Email already registered", body = ErrorEnvelope),
    ),
    tag = "auth"
)]
async fn register(
    State(state): State<AuthState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response> {
    validate_registration(&request)?;
    state.passwords.validate_password(&request.password)?;

    let hash = state.passwords.hash_password(&request.password)?;
    let mut user = User::new(request.email.trim().to_lowercase(), Some(hash));
    user.first_name = request.first_name;
    user.last_name = request.last_name;
    user.phone = request.phone.as_deref().map(|p| p.trim().to_string());

    state.users.insert(&user).await?;
    tracing::info!(user_id = %user.id, "user registered");

    let body = ApiEnvelope::created(UserResponse::from(user), "Account created");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiEnvelope<LoginResponse>),
        (status = 401, description = "Incorrect password", body = ErrorEnvelope),
        (status = 404, description = "No account for this email", body = ErrorEnvelope),
    ),
    tag = "auth"
)]
async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiEnvelope<LoginResponse>>)> {
    let user = state
        .users
        .find_by_email(&request.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or(AppError::InvalidCredentials)?;
    if !state.passwords.verify_password(&request.password, hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let pair = state.auth.issue_pair(&user.id, user.role)?;
    state
        .users
        .set_refresh_token_id(&user.id, Some(&pair.refresh_jti))
        .await?;
    tracing::info!(user_id = %user.id, "user logged in");

    let jar = auth_cookies(
        jar,
        &pair,
        state.auth.access_ttl_secs(),
        state.auth.refresh_ttl_secs(),
    );
    let body = ApiEnvelope::ok(
        LoginResponse {
            user: UserResponse::from(user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
        "Logged in",
    );
    Ok((jar, Json(body)))
}

/// Log out, invalidating the stored refresh token
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiEnvelope<serde_json::Value>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    ),
    tag = "auth"
)]
async fn logout(
    State(state): State<AuthState>,
    auth: Authenticated,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiEnvelope<serde_json::Value>>)> {
    state.users.set_refresh_token_id(&auth.user_id, None).await?;
    tracing::info!(user_id = %auth.user_id, "user logged out");

    let jar = clear_auth_cookies(jar);
    Ok((jar, Json(ApiEnvelope::ok(serde_json::json!({}), "Logged out"))))
}

/// Mint a new access token from the refresh token (cookie or body).
/// The refresh token rotates on every use; a stale one is rejected.
#[utoipa::path(
    post,
    path = "/recreateAccessToken",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token issued", body = ApiEnvelope<AccessTokenResponse>),
        (status = 401, description = "Refresh token missing, expired, or rotated out", body = ErrorEnvelope),
    ),
    tag = "auth"
)]
async fn recreate_access_token(
    State(state): State<AuthState>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<(CookieJar, Json<ApiEnvelope<AccessTokenResponse>>)> {
    let cookie = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    let token = refresh_token_from(cookie, body.map(|Json(b)| b))?;

    let claims = state.auth.validate_refresh_token(&token)?;
    let user = state
        .users
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Unknown user"))?;

    ensure_current(user.refresh_token_id.as_deref(), &claims.jti)?;

    let pair = state.auth.issue_pair(&user.id, user.role)?;
    state
        .users
        .set_refresh_token_id(&user.id, Some(&pair.refresh_jti))
        .await?;

    let access_token = pair.access_token.clone();
    let jar = auth_cookies(
        jar,
        &pair,
        state.auth.access_ttl_secs(),
        state.auth.refresh_ttl_secs(),
    );
    Ok((
        jar,
        Json(ApiEnvelope::ok(
            AccessTokenResponse { access_token },
            "Access token refreshed",
        )),
    ))
}

fn oauth_error_redirect(state: &AuthState, message: &str) -> Redirect {
    let url = format!(
        "{}?error={}",
        state.google.config().error_url,
        urlencoding::encode(message)
    );
    Redirect::to(&url)
}

/// Start the Google sign-in flow
#[utoipa::path(
    get,
    path = "/auth/google",
    responses(
        (status = 307, description = "Redirect to Google's consent screen"),
        (status = 500, description = "Google sign-in not configured", body = ErrorEnvelope),
    ),
    tag = "auth"
)]
async fn google_redirect(State(state): State<AuthState>) -> Result<Redirect> {
    if !state.google.config().is_configured() {
        return Err(AppError::internal("Google sign-in is not configured"));
    }
    let url = state.google.authorization_url(&TsidGenerator::generate());
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackParams {
    pub code: Option<String>,
    #[allow(dead_code)]
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Google redirects here after consent. All failures redirect to the
/// frontend error URL rather than rendering a JSON error.
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    responses(
        (status = 307, description = "Redirect to the frontend with a session"),
    ),
    tag = "auth"
)]
async fn google_callback(
    State(state): State<AuthState>,
    jar: CookieJar,
    Query(params): Query<GoogleCallbackParams>,
) -> Response {
    if let Some(error) = params.error {
        return oauth_error_redirect(&state, &error).into_response();
    }
    let Some(code) = params.code else {
        return oauth_error_redirect(&state, "Missing authorization code").into_response();
    };

    match federated_sign_in(&state, &code).await {
        Ok((pair, user_id)) => {
            tracing::info!(%user_id, "google sign-in succeeded");
            let jar = auth_cookies(
                jar,
                &pair,
                state.auth.access_ttl_secs(),
                state.auth.refresh_ttl_secs(),
            );
            (jar, Redirect::to(&state.google.config().success_url)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "google sign-in failed");
            oauth_error_redirect(&state, &e.to_string()).into_response()
        }
    }
}

async fn federated_sign_in(state: &AuthState, code: &str) -> Result<(TokenPair, String)> {
    let access_token = state.google.exchange_code(code).await?;
    let profile = state.google.fetch_profile(&access_token).await?;

    let by_google_id = state.users.find_by_google_id(&profile.sub).await?;
    let by_email = state.users.find_by_email(&profile.email).await?;

    let user = match classify_federation(by_google_id, by_email) {
        Federation::Linked(user) => user,
        Federation::Matched(user) => {
            state.users.link_google_id(&user.id, &profile.sub).await?;
            user
        }
        Federation::Created => {
            let hash = state.passwords.hash_password(&random_password())?;
            let mut user = User::new(profile.email.to_lowercase(), Some(hash));
            user.first_name = profile.given_name.or(profile.name);
            user.last_name = profile.family_name;
            user.google_id = Some(profile.sub);
            state.users.insert(&user).await?;
            user
        }
    };

    let pair = state.auth.issue_pair(&user.id, user.role)?;
    state
        .users
        .set_refresh_token_id(&user.id, Some(&pair.refresh_jti))
        .await?;
    Ok((pair, user.id))
}

/// Whether the caller currently holds a valid session
#[utoipa::path(
    get,
    path = "/auth/google/status",
    responses(
        (status = 200, description = "Session status", body = ApiEnvelope<SessionStatusResponse>),
    ),
    tag = "auth"
)]
async fn google_status(
    State(state): State<AuthState>,
    auth: OptionalAuth,
) -> Result<Json<ApiEnvelope<SessionStatusResponse>>> {
    let user = match auth.0 {
        Some(ctx) => state.users.find_by_id(&ctx.user_id).await?,
        None => None,
    };
    Ok(Json(ApiEnvelope::ok(
        SessionStatusResponse {
            authenticated: user.is_some(),
            user: user.map(UserResponse::from),
        },
        "Session status",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Asha".to_string()),
            last_name: None,
            email: "asha@example.com".to_string(),
            phone: Some("0771234567".to_string()),
            password: "longenough".to_string(),
            confirm_password: "longenough".to_string(),
        }
    }

    #[test]
    fn test_registration_requires_phone() {
        let mut request = registration();
        request.phone = None;
        assert!(validate_registration(&request).is_err());

        request.phone = Some("   ".to_string());
        assert!(validate_registration(&request).is_err());

        assert!(validate_registration(&registration()).is_ok());
    }

    #[test]
    fn test_registration_rejects_password_mismatch() {
        let mut request = registration();
        request.confirm_password = "different".to_string();
        let err = validate_registration(&request).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_refresh_token_cookie_wins_over_body() {
        let body = RefreshTokenRequest {
            refresh_token: Some("from-body".to_string()),
        };
        let token = refresh_token_from(Some("from-cookie".to_string()), Some(body)).unwrap();
        assert_eq!(token, "from-cookie");
    }

    #[test]
    fn test_refresh_token_falls_back_to_body() {
        let body = RefreshTokenRequest {
            refresh_token: Some("from-body".to_string()),
        };
        let token = refresh_token_from(None, Some(body)).unwrap();
        assert_eq!(token, "from-body");

        assert!(refresh_token_from(None, Some(RefreshTokenRequest::default())).is_err());
        assert!(refresh_token_from(None, None).is_err());
    }

    #[test]
    fn test_login_response_carries_both_tokens() {
        let user = User::new("asha@example.com", None);
        let response = LoginResponse {
            user: UserResponse::from(user),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "access");
        assert_eq!(json["refreshToken"], "refresh");
    }
}
