//! Posting and removing reviews.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shelf_core::NewReview;

use super::{ApiJson, ApiPath};
use crate::auth::AuthUser;
use crate::dto::{ReviewRequest, ReviewResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// `POST /api/reviews` `{book, rating, text}`
pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    let review = state
        .db
        .reviews()
        .create(
            user.id,
            &NewReview {
                book_id: body.book,
                rating: body.rating,
                text: body.text,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(review.into())))
}

/// `DELETE /api/reviews/{id}`: own reviews, or any review for staff.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state
        .db
        .reviews()
        .delete(id, user.id, user.is_superuser)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
