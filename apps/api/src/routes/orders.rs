//! Checkout and the caller's orders.
//!
//! Status changes: the owner may only cancel an order that is still `new`;
//! a superuser may make any move the workflow allows.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shelf_core::OrderStatus;

use super::{ApiJson, ApiPath};
use crate::auth::AuthUser;
use crate::dto::{OrderResponse, OrderStatusRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/orders`: newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = state.db.orders().list_for_user(user.id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// `POST /api/orders`: checks out the caller's cart.
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let order = state.checkout().place_order(user.id).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// `GET /api/orders/{id}`
pub async fn detail(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<OrderResponse>> {
    Ok(Json(state.db.orders().get_for_user(user.id, id).await?.into()))
}

/// `PATCH /api/orders/{id}` `{status}`
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<OrderStatusRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let next: OrderStatus = body.status.parse()?;

    let current = if user.is_superuser {
        state.db.orders().get(id).await?
    } else {
        state.db.orders().get_for_user(user.id, id).await?
    };

    // Moves the workflow forbids fall through to transition() and its 409.
    let status = current.order.status;
    if !user.is_superuser && status.can_transition_to(next) && !status.owner_may_request(next) {
        return Err(ApiError::Forbidden(format!(
            "Only staff can move an order to {}",
            next
        )));
    }

    Ok(Json(state.db.orders().transition(id, next).await?.into()))
}
