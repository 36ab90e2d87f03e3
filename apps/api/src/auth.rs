//! JWT authentication module.
//!
//! Issues access tokens at login and resolves `Authorization: Bearer` headers
//! back into users for protected routes.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use shelf_core::User;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Username at issue time
    pub username: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type, always "access"
    pub token_type: String,
}

impl Claims {
    /// The user id this token was issued for.
    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, access_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
        }
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate that a token is a live access token and decode it.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "Rejected token");
                ApiError::Unauthorized("Invalid token".to_string())
            })?;

        if token_data.claims.token_type != "access" {
            return Err(ApiError::Unauthorized("Expected access token".to_string()));
        }

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .finish_non_exhaustive()
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor that requires a valid access token.
///
/// The user is reloaded on every request, so deleted accounts and revoked
/// staff rights take effect immediately.
///
/// ```rust,ignore
/// async fn profile(AuthUser(user): AuthUser) -> Json<ProfileResponse> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("Authentication credentials were not provided".to_string())
            })?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

        let claims = state.jwt.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        match state.db.users().get(user_id).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(err) if err.is_not_found() => {
                Err(ApiError::Unauthorized("User not found".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Extractor that requires a superuser.
#[derive(Debug, Clone)]
pub struct SuperUser(pub User);

impl FromRequestParts<Arc<AppState>> for SuperUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_superuser {
            return Err(ApiError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ));
        }

        Ok(SuperUser(user))
    }
}
