//! Google OAuth 2.0 sign-in
//!
//! Implements the authorization-code flow against Google's OAuth
//! endpoints and classifies the resulting profile against existing
//! user records.

use rand::Rng;
use serde::Deserialize;

use crate::shared::error::{AppError, Result};
use crate::user::entity::User;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Frontend URL to redirect to after successful sign-in
    pub success_url: String,
    /// Frontend URL to redirect to on failure
    pub error_url: String,
}

impl GoogleOAuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Profile fields returned by Google's userinfo endpoint
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleOAuthService {
    client: reqwest::Client,
    config: GoogleOAuthConfig,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuthService {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    /// Override the Google endpoints, used by tests to point at a mock server
    pub fn with_endpoints(
        config: GoogleOAuthConfig,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: token_url.into(),
            userinfo_url: userinfo_url.into(),
        }
    }

    pub fn config(&self) -> &GoogleOAuthConfig {
        &self.config
    }

    /// Build the consent-screen URL the browser is redirected to
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline",
            self.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    /// Exchange the authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("redirect_uri", &self.config.redirect_uri),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Google token exchange failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "Google token exchange rejected");
            return Err(AppError::unauthorized("Google sign-in was rejected"));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid token response from Google: {e}")))?;

        Ok(token.access_token)
    }

    /// Fetch the user profile for an access token
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Google userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::unauthorized("Google profile lookup was rejected"));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid userinfo response from Google: {e}")))
    }
}

/// How a Google profile relates to existing user records
#[derive(Debug)]
pub enum Federation {
    /// A user already linked to this Google account
    Linked(User),
    /// A user with the same email, not yet linked
    Matched(User),
    /// No existing user; a new account must be created
    Created,
}

/// Classify a Google profile against lookups by googleId and by email.
/// Lookup order matters: an explicit link always wins over an email match.
pub fn classify_federation(by_google_id: Option<User>, by_email: Option<User>) -> Federation {
    if let Some(user) = by_google_id {
        return Federation::Linked(user);
    }
    if let Some(user) = by_email {
        return Federation::Matched(user);
    }
    Federation::Created
}

/// Generate a random password for federated accounts. It is immediately
/// hashed and never shown to anyone, so local login stays impossible
/// until the user sets a real password.
pub fn random_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::entity::{User, UserRole};

    fn sample_user(id: &str) -> User {
        User {
            id: id.to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            email: format!("{id}@example.com"),
            phone: None,
            password_hash: Some("hash".to_string()),
            role: UserRole::User,
            google_id: None,
            refresh_token_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_linked_wins_over_email_match() {
        let linked = sample_user("linked");
        let matched = sample_user("matched");
        match classify_federation(Some(linked), Some(matched)) {
            Federation::Linked(user) => assert_eq!(user.id, "linked"),
            other => panic!("expected Linked, got {other:?}"),
        }
    }

    #[test]
    fn test_email_match_when_not_linked() {
        let matched = sample_user("matched");
        match classify_federation(None, Some(matched)) {
            Federation::Matched(user) => assert_eq!(user.id, "matched"),
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn test_created_when_unknown() {
        assert!(matches!(classify_federation(None, None), Federation::Created));
    }

    #[test]
    fn test_random_password_length_and_variety() {
        let p1 = random_password();
        let p2 = random_password();
        assert_eq!(p1.len(), 32);
        assert_ne!(p1, p2);
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let service = GoogleOAuthService::new(GoogleOAuthConfig {
            client_id: "client id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:4000/user/google/callback".to_string(),
            success_url: "http://localhost:3000".to_string(),
            error_url: "http://localhost:3000/login".to_string(),
        });
        let url = service.authorization_url("xyz");
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=xyz"));
    }

    #[tokio::test]
    async fn test_exchange_code_against_mock() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.mock",
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let service = GoogleOAuthService::with_endpoints(
            GoogleOAuthConfig {
                client_id: "cid".to_string(),
                client_secret: "secret".to_string(),
                redirect_uri: "http://localhost/cb".to_string(),
                success_url: String::new(),
                error_url: String::new(),
            },
            format!("{}/token", server.uri()),
            format!("{}/userinfo", server.uri()),
        );

        let token = service.exchange_code("code123").await.unwrap();
        assert_eq!(token, "ya29.mock");
    }

    #[tokio::test]
    async fn test_rejected_code_maps_to_unauthorized() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let service = GoogleOAuthService::with_endpoints(
            GoogleOAuthConfig {
                client_id: "cid".to_string(),
                client_secret: "secret".to_string(),
                redirect_uri: "http://localhost/cb".to_string(),
                success_url: String::new(),
                error_url: String::new(),
            },
            format!("{}/token", server.uri()),
            format!("{}/userinfo", server.uri()),
        );

        let err = service.exchange_code("bad").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }
}
