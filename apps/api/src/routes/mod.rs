//! HTTP routes.
//!
//! ```text
//! /api
//! ├── health                         GET
//! ├── register, login                POST
//! ├── profile                        GET PATCH          (user)
//! ├── categories[/{id}]              GET | POST PUT DELETE (superuser)
//! ├── books[/{id}]                   GET | POST PATCH DELETE (superuser)
//! ├── cart                           GET                (user)
//! │   └── add, reduce_quantity, delete_item   POST
//! ├── orders[/{id}]                  GET POST | GET PATCH (user)
//! ├── reviews[/{id}]                 POST | DELETE      (user)
//! └── favorites[/ids]                GET, toggle POST   (user)
//! ```

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;

pub mod account;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod reviews;

/// JSON body whose rejections render as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Path parameters whose rejections render as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query string whose rejections render as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// All `/api` routes.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/profile", get(account::profile).patch(account::update_profile))
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route(
            "/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route("/books", get(catalog::list_books).post(catalog::create_book))
        .route(
            "/books/{id}",
            get(catalog::book_detail)
                .patch(catalog::update_book)
                .delete(catalog::delete_book),
        )
        .route("/cart", get(cart::view))
        .route("/cart/add", post(cart::add))
        .route("/cart/reduce_quantity", post(cart::reduce_quantity))
        .route("/cart/delete_item", post(cart::delete_item))
        .route("/orders", get(orders::list).post(orders::checkout))
        .route("/orders/{id}", get(orders::detail).patch(orders::update_status))
        .route("/reviews", post(reviews::create))
        .route("/reviews/{id}", delete(reviews::delete))
        .route("/favorites", get(favorites::list))
        .route("/favorites/ids", get(favorites::ids))
        .route("/favorites/toggle", post(favorites::toggle))
}
