//! The caller's cart.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::dto::{BookIdRequest, CartAddResponse, CartResponse, StatusResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/cart`
pub async fn view(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<CartResponse>> {
    Ok(Json(state.db.carts().get(user.id).await?.into()))
}

/// `POST /api/cart/add` `{book_id}`
pub async fn add(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<BookIdRequest>,
) -> ApiResult<Json<CartAddResponse>> {
    let book_id = require_book_id(&body)?;
    let quantity = state.db.carts().add(user.id, book_id).await?;

    Ok(Json(CartAddResponse {
        status: "added",
        quantity,
    }))
}

/// `POST /api/cart/reduce_quantity` `{book_id}`
pub async fn reduce_quantity(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<BookIdRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let book_id = require_book_id(&body)?;
    state.db.carts().reduce(user.id, book_id).await?;
    Ok(Json(StatusResponse { status: "reduced" }))
}

/// `POST /api/cart/delete_item` `{book_id}`
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<BookIdRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let book_id = require_book_id(&body)?;
    state.db.carts().remove(user.id, book_id).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}

fn require_book_id(body: &BookIdRequest) -> ApiResult<i64> {
    body.book_id
        .ok_or_else(|| ApiError::BadRequest("no id".to_string()))
}
