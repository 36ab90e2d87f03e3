//! Request and response bodies.
//!
//! Domain types carry money as integer minor units; everything leaving the
//! API renders it as a two-decimal string (`"850.00"`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::{
    BookDetail, BookSummary, Cart, CartLine, Category, OrderDetail, OrderItem, OrderStatus, Review,
    User,
};

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        ProfileResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_superuser: user.is_superuser,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub title: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        CategoryResponse {
            id: category.id,
            title: category.title,
        }
    }
}

/// Query string of `GET /api/books`.
#[derive(Debug, Default, Deserialize)]
pub struct BookListParams {
    pub search: Option<String>,
    pub category: Option<i64>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
}

/// Body of `POST /api/books`. Price is a decimal string or number.
#[derive(Debug, Deserialize)]
pub struct NewBookRequest {
    pub category: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub price: PriceInput,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Body of `PATCH /api/books/{id}`. `"image": null` removes the image.
#[derive(Debug, Default, Deserialize)]
pub struct BookPatchRequest {
    pub category: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    #[serde(default, deserialize_with = "shelf_core::types::nullable")]
    pub image: Option<Option<String>>,
    pub stock: Option<i64>,
}

/// A price as clients send it: `"850.50"` or `850.5`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(serde_json::Number),
}

impl PriceInput {
    pub fn as_text(&self) -> String {
        match self {
            PriceInput::Text(s) => s.clone(),
            PriceInput::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i64,
    pub category: i64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: String,
    pub image: Option<String>,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub avg_rating: f64,
    pub review_count: i64,
}

impl From<BookSummary> for BookResponse {
    fn from(summary: BookSummary) -> Self {
        let price = summary.book.price().to_string();
        let book = summary.book;
        BookResponse {
            id: book.id,
            category: book.category_id,
            title: book.title,
            author: book.author,
            description: book.description,
            price,
            image: book.image_url,
            stock: book.stock,
            created_at: book.created_at,
            avg_rating: round_rating(summary.avg_rating),
            review_count: summary.review_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub reviews: Vec<ReviewResponse>,
}

impl From<BookDetail> for BookDetailResponse {
    fn from(detail: BookDetail) -> Self {
        BookDetailResponse {
            book: detail.summary.into(),
            reviews: detail.reviews.into_iter().map(Into::into).collect(),
        }
    }
}

fn round_rating(avg: f64) -> f64 {
    (avg * 100.0).round() / 100.0
}

// =============================================================================
// Reviews & Favorites
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub book: i64,
    pub rating: i64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub book: i64,
    pub user: i64,
    pub username: String,
    pub rating: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id,
            book: review.book_id,
            user: review.user_id,
            username: review.username,
            rating: review.rating,
            text: review.text,
            created_at: review.created_at,
        }
    }
}

/// Body naming a book: cart mutations and favorite toggles.
#[derive(Debug, Default, Deserialize)]
pub struct BookIdRequest {
    #[serde(default)]
    pub book_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteToggleResponse {
    pub is_favorite: bool,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: i64,
    pub user: i64,
    pub items: Vec<CartItemResponse>,
    pub total_price: String,
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub book: CartBookResponse,
    pub quantity: i64,
    pub total_price: String,
}

#[derive(Debug, Serialize)]
pub struct CartBookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub image: Option<String>,
    pub price: String,
    pub stock: i64,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let total_price = line.line_total().to_string();
        let price = line.unit_price().to_string();
        CartItemResponse {
            book: CartBookResponse {
                id: line.book_id,
                title: line.title,
                author: line.author,
                image: line.image_url,
                price,
                stock: line.stock,
            },
            quantity: line.quantity,
            total_price,
        }
    }
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let total_price = cart.total().to_string();
        CartResponse {
            id: cart.id,
            user: cart.user_id,
            items: cart.lines.into_iter().map(Into::into).collect(),
            total_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartAddResponse {
    pub status: &'static str,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user: i64,
    pub status: OrderStatus,
    pub total_price: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub book_title: String,
    pub quantity: i64,
    pub price: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        OrderItemResponse {
            price: item.unit_price().to_string(),
            book_title: item.title_snapshot,
            quantity: item.quantity,
        }
    }
}

impl From<OrderDetail> for OrderResponse {
    fn from(detail: OrderDetail) -> Self {
        let order = detail.order;
        OrderResponse {
            id: order.id,
            user: order.user_id,
            status: order.status,
            total_price: order.total().to_string(),
            created_at: order.created_at,
            items: detail.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::Order;

    #[test]
    fn test_order_renders_money_as_strings() {
        let now = Utc::now();
        let response = OrderResponse::from(OrderDetail {
            order: Order {
                id: 1,
                user_id: 2,
                status: OrderStatus::New,
                total_cents: 230_000,
                created_at: now,
                updated_at: now,
            },
            items: vec![OrderItem {
                id: 10,
                order_id: 1,
                book_id: Some(5),
                title_snapshot: "Dune".to_string(),
                quantity: 2,
                price_cents: 85_000,
            }],
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_price"], "2300.00");
        assert_eq!(json["status"], "new");
        assert_eq!(json["items"][0]["book_title"], "Dune");
        assert_eq!(json["items"][0]["price"], "850.00");
    }

    #[test]
    fn test_price_input_accepts_number_or_text() {
        let text: PriceInput = serde_json::from_str("\"850.50\"").unwrap();
        let number: PriceInput = serde_json::from_str("850.5").unwrap();
        assert_eq!(text.as_text(), "850.50");
        assert_eq!(number.as_text(), "850.5");
    }

    #[test]
    fn test_rating_is_rounded() {
        assert_eq!(round_rating(4.666_666), 4.67);
        assert_eq!(round_rating(0.0), 0.0);
    }
}
