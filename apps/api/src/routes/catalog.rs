//! Categories and books. Reads are public, writes need a superuser.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shelf_core::validation::validate_search_query;
use shelf_core::{BookOrdering, BookPatch, BookQuery, Money, NewBook, Page, DEFAULT_BOOK_STOCK};
use tracing::info;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::SuperUser;
use crate::dto::{
    BookDetailResponse, BookListParams, BookPatchRequest, BookResponse, CategoryRequest,
    CategoryResponse, NewBookRequest, PriceInput,
};
use crate::error::ApiResult;
use crate::state::AppState;

// =============================================================================
// Categories
// =============================================================================

/// `GET /api/categories` (unpaginated)
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CategoryResponse>>> {
    let categories = state.db.categories().list().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// `GET /api/categories/{id}`
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<CategoryResponse>> {
    Ok(Json(state.db.categories().get(id).await?.into()))
}

/// `POST /api/categories`
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    SuperUser(admin): SuperUser,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryResponse>)> {
    let category = state.db.categories().create(&body.title).await?;
    info!(category_id = category.id, admin_id = admin.id, "Category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// `PUT /api/categories/{id}`
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    SuperUser(_): SuperUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> ApiResult<Json<CategoryResponse>> {
    Ok(Json(state.db.categories().update(id, &body.title).await?.into()))
}

/// `DELETE /api/categories/{id}`. Takes the category's books with it.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    SuperUser(admin): SuperUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.db.categories().delete(id).await?;
    info!(category_id = id, admin_id = admin.id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Books
// =============================================================================

/// `GET /api/books?search=&category=&ordering=&page=`
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<BookListParams>,
) -> ApiResult<Json<Page<BookResponse>>> {
    let search = match params.search.as_deref() {
        Some(raw) => validate_search_query(raw)?,
        None => None,
    };
    let ordering = match params.ordering.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse::<BookOrdering>()?,
        _ => BookOrdering::default(),
    };

    let query = BookQuery {
        search,
        category_id: params.category,
        ordering,
        page: params.page.unwrap_or(1).max(1),
        ..BookQuery::default()
    };

    let page = state.db.books().list(&query).await?;
    Ok(Json(page.map(BookResponse::from)))
}

/// `GET /api/books/{id}`: book, rating and reviews.
pub async fn book_detail(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<BookDetailResponse>> {
    Ok(Json(state.db.books().detail(id).await?.into()))
}

/// `POST /api/books`
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    SuperUser(admin): SuperUser,
    ApiJson(body): ApiJson<NewBookRequest>,
) -> ApiResult<(StatusCode, Json<BookResponse>)> {
    let new_book = NewBook {
        category_id: body.category,
        title: body.title,
        author: body.author,
        description: body.description,
        price_cents: parse_price(&body.price)?,
        image_url: body.image,
        stock: body.stock.unwrap_or(DEFAULT_BOOK_STOCK),
    };

    let book = state.db.books().create(&new_book).await?;
    info!(book_id = book.id, admin_id = admin.id, "Book created");

    let summary = state.db.books().get_summary(book.id).await?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

/// `PATCH /api/books/{id}`
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    SuperUser(_): SuperUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<BookPatchRequest>,
) -> ApiResult<Json<BookResponse>> {
    let patch = BookPatch {
        category_id: body.category,
        title: body.title,
        author: body.author,
        description: body.description,
        price_cents: body.price.as_ref().map(parse_price).transpose()?,
        image_url: body.image,
        stock: body.stock,
    };

    state.db.books().update(id, &patch).await?;
    Ok(Json(state.db.books().get_summary(id).await?.into()))
}

/// `DELETE /api/books/{id}`
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    SuperUser(admin): SuperUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.db.books().delete(id).await?;
    info!(book_id = id, admin_id = admin.id, "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_price(input: &PriceInput) -> ApiResult<i64> {
    let money: Money = input.as_text().parse()?;
    Ok(money.cents())
}
