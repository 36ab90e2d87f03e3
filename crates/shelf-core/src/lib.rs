//! # shelf-core: Pure Business Logic for Shelf
//!
//! This crate contains the bookstore's domain model and business rules as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web frontend (SPA)                           │   │
//! │  │    Catalog ──► Book page ──► Cart ──► Checkout ──► Orders       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shelf-api (axum)                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│  │   │
//! │  │   │   Book    │  │   Money   │  │   plan    │  │   rules   │  │   │
//! │  │   │   Order   │  │           │  │  policy   │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shelf-db (Database Layer)                    │   │
//! │  │         SQLite queries, migrations, transactional checkout      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Cart, Order, Review, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`checkout`] - Turns a cart into an order plan under a stock policy
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::money::Money;
//!
//! let price: Money = "850".parse().unwrap();
//! assert_eq!((price * 2_i64).to_string(), "1700.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{plan_checkout, CheckoutPlan, PlannedLine, StockPolicy};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single book in a cart.
///
/// Guards against runaway "add" loops from a misbehaving client.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Number of books per catalog page.
pub const BOOKS_PAGE_SIZE: u32 = 12;

/// Highest book price in minor units (99 999 999.99).
///
/// Ten digits with two decimal places, so a full cart line (price × 999)
/// stays far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Stock assigned to a new book when none is given.
pub const DEFAULT_BOOK_STOCK: i64 = 10;

/// Lowest allowed review rating.
pub const MIN_RATING: i64 = 1;

/// Highest allowed review rating.
pub const MAX_RATING: i64 = 5;
