//! Registration, login and profile.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shelf_core::ProfilePatch;
use shelf_db::DbError;
use tracing::{info, warn};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::dto::{CredentialsRequest, LoginResponse, ProfileResponse, RegisterResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /api/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let (username, password) = match (body.username, body.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u, p),
        _ => return Err(ApiError::BadRequest("Fill in all fields".to_string())),
    };

    let user = match state.db.users().create(&username, &password, false).await {
        Ok(user) => user,
        Err(DbError::UniqueViolation { .. }) => {
            return Err(ApiError::BadRequest("User already exists".to_string()))
        }
        Err(err) => return Err(err.into()),
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            status: "success",
            id: user.id,
        }),
    ))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let Some(user) = state.db.users().authenticate(&username, &password).await? else {
        warn!(username = %username, "Failed login");
        return Err(ApiError::BadRequest("Invalid username or password".to_string()));
    };

    let token = state.jwt.generate_access_token(&user)?;
    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        status: "success",
        username: user.username,
        token,
    }))
}

/// `GET /api/profile`
pub async fn profile(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(user.into())
}

/// `PATCH /api/profile`
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> ApiResult<Json<ProfileResponse>> {
    let updated = state.db.users().update_profile(user.id, &patch).await?;
    Ok(Json(updated.into()))
}
