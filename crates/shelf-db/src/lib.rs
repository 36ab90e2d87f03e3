//! # shelf-db: Database Layer for Shelf
//!
//! SQLite storage for the bookstore, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders/create)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  BookRepo     │    │  (embedded)  │  │   │
//! │  │   │               │    │  CartRepo     │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│  OrderRepo    │    │              │  │   │
//! │  │   │ WAL + busy    │    │  ...          │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │                        ┌───────▼───────┐                       │   │
//! │  │                        │   Checkout    │  one transaction:     │   │
//! │  │                        │ (checkout.rs) │  order + stock + cart │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (shelf.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, account, cart, order, review and favorite access
//! - [`checkout`] - Cart-to-order transaction
//! - [`password`] - Argon2 password hashing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_core::StockPolicy;
//! use shelf_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shelf.db")).await?;
//!
//! let user = db.users().create("reader", "s3cret", false).await?;
//! db.carts().add(user.id, book_id).await?;
//! let order = db.checkout(StockPolicy::Strict).place_order(user.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::Checkout;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    BookRepository, CartRepository, CategoryRepository, FavoriteRepository, OrderRepository,
    ReviewRepository, UserRepository,
};
