//! Bookmarked books.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::dto::{BookIdRequest, BookResponse, FavoriteToggleResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/favorites`
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let books = state.db.favorites().list_books(user.id).await?;
    Ok(Json(books.into_iter().map(Into::into).collect()))
}

/// `GET /api/favorites/ids`
pub async fn ids(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<i64>>> {
    Ok(Json(state.db.favorites().ids(user.id).await?))
}

/// `POST /api/favorites/toggle` `{book_id}`
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<BookIdRequest>,
) -> ApiResult<Json<FavoriteToggleResponse>> {
    let book_id = body
        .book_id
        .ok_or_else(|| ApiError::BadRequest("no id".to_string()))?;

    let is_favorite = state.db.favorites().toggle(user.id, book_id).await?;
    Ok(Json(FavoriteToggleResponse { is_favorite }))
}
