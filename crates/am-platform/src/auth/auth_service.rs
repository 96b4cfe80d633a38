//! JWT token service
//!
//! Issues short-lived access tokens and long-lived refresh tokens as
//! HS256 JWTs. Each refresh token carries a `jti`; the currently valid
//! jti is persisted on the user record so that rotation invalidates
//! every previously issued refresh token.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::shared::error::{AppError, Result};
use crate::shared::tsid::TsidGenerator;
use crate::user::entity::UserRole;

/// Configuration for the token service
#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            issuer: "agrimart".to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 3600,
        }
    }
}

/// Claims carried in the access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub role: UserRole,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims carried in the refresh token
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// An access/refresh token pair plus the refresh jti to persist
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_jti: String,
}

pub struct AuthService {
    config: AuthConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let access_encoding = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let refresh_decoding = DecodingKey::from_secret(config.refresh_secret.as_bytes());
        Self {
            config,
            access_encoding,
            access_decoding,
            refresh_encoding,
            refresh_decoding,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.config.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.config.refresh_ttl_secs
    }

    /// Issue a fresh access/refresh pair for a user. The caller must
    /// persist `refresh_jti` on the user record to complete rotation.
    pub fn issue_pair(&self, user_id: &str, role: UserRole) -> Result<TokenPair> {
        let now = chrono::Utc::now().timestamp();
        let refresh_jti = TsidGenerator::generate();

        let access = AccessTokenClaims {
            sub: user_id.to_string(),
            role,
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.access_ttl_secs,
            jti: TsidGenerator::generate(),
        };

        let refresh = RefreshTokenClaims {
            sub: user_id.to_string(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.refresh_ttl_secs,
            jti: refresh_jti.clone(),
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access, &self.access_encoding)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))?;
        let refresh_token = encode(&header, &refresh, &self.refresh_encoding)
            .map_err(|e| AppError::internal(format!("Failed to sign refresh token: {e}")))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_jti,
        })
    }

    /// Issue only an access token; used when refreshing without rotating.
    pub fn issue_access_token(&self, user_id: &str, role: UserRole) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            role,
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.access_ttl_secs,
            jti: TsidGenerator::generate(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<AccessTokenClaims>(token, &self.access_decoding, &validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<RefreshTokenClaims>(token, &self.refresh_decoding, &validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AppError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken {
            message: e.to_string(),
        },
    }
}

/// A presented refresh jti is only valid when it matches the one stored
/// on the user record. Anything else means the token was rotated out
/// (or never issued) and the session must re-authenticate.
pub fn ensure_current(stored_jti: Option<&str>, presented_jti: &str) -> Result<()> {
    match stored_jti {
        Some(stored) if stored == presented_jti => Ok(()),
        _ => Err(AppError::unauthorized("Refresh token is no longer valid")),
    }
}

/// Extract a bearer token from an `Authorization` header value
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig {
            access_secret: "access-test-secret".to_string(),
            refresh_secret: "refresh-test-secret".to_string(),
            issuer: "agrimart-test".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 3600,
        })
    }

    #[test]
    fn test_issue_and_validate_pair() {
        let service = test_service();
        let pair = service.issue_pair("user-1", UserRole::Admin).unwrap();

        let access = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(access.sub, "user-1");
        assert_eq!(access.role, UserRole::Admin);

        let refresh = service.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, "user-1");
        assert_eq!(refresh.jti, pair.refresh_jti);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let service = test_service();
        let pair = service.issue_pair("user-1", UserRole::User).unwrap();

        // Access token signed with the access secret must fail refresh validation
        assert!(service.validate_refresh_token(&pair.access_token).is_err());
        assert!(service.validate_access_token(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let service = test_service();
        let other = AuthService::new(AuthConfig {
            access_secret: "different-secret".to_string(),
            refresh_secret: "also-different".to_string(),
            issuer: "agrimart-test".to_string(),
            ..AuthConfig::default()
        });

        let pair = other.issue_pair("user-1", UserRole::User).unwrap();
        let err = service.validate_access_token(&pair.access_token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken { .. }));
    }

    #[test]
    fn test_expired_token_rejected() {
        // jsonwebtoken applies 60s leeway, so expire well past it
        let service = AuthService::new(AuthConfig {
            access_secret: "access-test-secret".to_string(),
            refresh_secret: "refresh-test-secret".to_string(),
            issuer: "agrimart-test".to_string(),
            access_ttl_secs: -120,
            refresh_ttl_secs: -120,
        });

        let pair = service.issue_pair("user-1", UserRole::User).unwrap();
        let err = service.validate_access_token(&pair.access_token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = test_service();
        let err = service.validate_access_token("not.a.jwt").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken { .. }));
    }

    #[test]
    fn test_ensure_current() {
        assert!(ensure_current(Some("abc"), "abc").is_ok());
        assert!(ensure_current(Some("abc"), "xyz").is_err());
        assert!(ensure_current(None, "abc").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }
}
