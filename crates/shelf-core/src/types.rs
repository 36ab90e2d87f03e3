//! # Domain Types
//!
//! Core domain types used throughout Shelf.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│      Book       │◄──│     Review      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  rating 1..=5   │       │
//! │  │  title          │   │  price_cents    │   │  text           │       │
//! │  └─────────────────┘   │  stock (>= 0)   │   └─────────────────┘       │
//! │                        └────────▲────────┘                              │
//! │                                 │                                       │
//! │  ┌─────────────────┐   ┌────────┴────────┐   ┌─────────────────┐       │
//! │  │      Cart       │──►│    CartLine     │   │     Order       │       │
//! │  │  1:1 with User  │   │  quantity >= 1  │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   │  total_cents    │       │
//! │                                              └────────┬────────┘       │
//! │                                              ┌────────▼────────┐       │
//! │                                              │   OrderItem     │       │
//! │                                              │  (snapshot)     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are stored as integer minor units (`*_cents`) and converted to
//! [`Money`] for arithmetic and display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A catalog section ("Fantasy", "Detective", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub title: String,
}

// =============================================================================
// Book
// =============================================================================

/// A book in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Book {
    pub id: i64,

    /// Category this book belongs to.
    pub category_id: i64,

    pub title: String,
    pub author: String,

    /// Free text, may be empty.
    pub description: String,

    /// Price in minor units.
    pub price_cents: i64,

    /// Cover image location, if any.
    pub image_url: Option<String>,

    /// Copies on hand. Never negative.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A book together with its review aggregate, as listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BookSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub book: Book,

    /// Mean rating, 0 when there are no reviews.
    pub avg_rating: f64,

    pub review_count: i64,
}

/// Input for creating a book.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBook {
    pub category_id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_stock")]
    pub stock: i64,
}

fn default_stock() -> i64 {
    crate::DEFAULT_BOOK_STOCK
}

/// Partial update of a book. `None` leaves the field untouched.
///
/// `image_url` is tri-state: absent keeps the image, `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookPatch {
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub stock: Option<i64>,
}

/// Deserializes a present field (including `null`) as `Some`, so that
/// `Option<Option<T>>` can tell "absent" from "set to null".
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Catalog Query
// =============================================================================

/// Column a book listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookSortField {
    Price,
    CreatedAt,
    AverageRating,
}

/// Sort order of a book listing, parsed from `price`, `-created_at`, ...
///
/// A leading `-` means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookOrdering {
    pub field: BookSortField,
    pub descending: bool,
}

impl Default for BookOrdering {
    /// Newest books first.
    fn default() -> Self {
        BookOrdering {
            field: BookSortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for BookOrdering {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let field = match name {
            "price" => BookSortField::Price,
            "created_at" => BookSortField::CreatedAt,
            "average_rating" => BookSortField::AverageRating,
            _ => {
                return Err(ValidationError::NotAllowed {
                    field: "ordering".to_string(),
                    allowed: vec![
                        "price".to_string(),
                        "created_at".to_string(),
                        "average_rating".to_string(),
                    ],
                })
            }
        };

        Ok(BookOrdering { field, descending })
    }
}

/// Filters for listing books.
#[derive(Debug, Clone)]
pub struct BookQuery {
    /// Substring of title or author; ASCII letters match in any case.
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub ordering: BookOrdering,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for BookQuery {
    fn default() -> Self {
        BookQuery {
            search: None,
            category_id: None,
            ordering: BookOrdering::default(),
            page: 1,
            page_size: crate::BOOKS_PAGE_SIZE,
        }
    }
}

impl BookQuery {
    /// Row offset of the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size.max(1))
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    /// Total number of matching rows across all pages.
    pub count: i64,
    /// Next page number, if there is one.
    pub next: Option<u32>,
    /// Previous page number, if there is one.
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds a page and works out its neighbours from the total count.
    pub fn new(results: Vec<T>, count: i64, page: u32, page_size: u32) -> Self {
        let shown = i64::from(page) * i64::from(page_size);
        Page {
            count,
            next: (shown < count).then(|| page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        }
    }

    /// Maps the results, keeping the pagination.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered customer or staff member.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Staff flag: catalog writes, any order transition, any review delete.
    pub is_superuser: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// One (book, quantity) entry in a cart, joined with the book's live data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLine {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub image_url: Option<String>,
    /// Current book price, not frozen.
    pub price_cents: i64,
    /// Current book stock.
    pub stock: i64,
    pub quantity: i64,
}

impl CartLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// A user's cart with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Sum of all line totals at current prices.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of copies across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle state of an order.
///
/// ```text
/// new ──► processing ──► shipped ──► completed
///  │           │
///  └──► cancelled ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Just placed at checkout.
    New,
    Processing,
    Shipped,
    /// Terminal.
    Completed,
    /// Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether the workflow allows moving from `self` to `next`.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (New, Processing)
                | (New, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Completed)
        )
    }

    /// Whether the customer who placed the order may request `next` themselves.
    ///
    /// Customers can only cancel an order nobody has started working on.
    pub const fn owner_may_request(&self, next: OrderStatus) -> bool {
        matches!((self, next), (OrderStatus::New, OrderStatus::Cancelled))
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::New
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["new", "processing", "shipped", "completed", "cancelled"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. Only `status` and `updated_at` change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    /// Σ(price × quantity) frozen at checkout.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of an order.
/// Uses snapshot pattern to freeze book data at time of checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// `None` once the book has been removed from the catalog.
    pub book_id: Option<i64>,
    /// Book title at time of checkout (frozen).
    pub title_snapshot: String,
    pub quantity: i64,
    /// Unit price at time of checkout (frozen).
    pub price_cents: i64,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// An order with its items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Review
// =============================================================================

/// A customer's rating and comment on a book.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    /// Author's username, read-only.
    pub username: String,
    pub rating: i64,
    pub text: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for posting a review.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewReview {
    pub book_id: i64,
    pub rating: i64,
    pub text: String,
}

/// A book with everything the detail page shows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookDetail {
    #[serde(flatten)]
    pub summary: BookSummary,
    /// Newest first.
    pub reviews: Vec<Review>,
}

// =============================================================================
// Unit Tests
// =============================================================================
