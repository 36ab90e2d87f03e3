//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shelf-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  shelf-api errors                                                      │
//! │  └── ApiError         - What HTTP clients see                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout was attempted on a cart with no lines.
    ///
    /// Nothing is written when this is returned.
    #[error("Empty cart")]
    EmptyCart,

    /// Book cannot be found.
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    /// Reduce/remove was requested for a book that has no cart line.
    #[error("not in cart")]
    NotInCart { book_id: i64 },

    /// Not enough stock to fulfil a cart line.
    ///
    /// ## When This Occurs
    /// Only under [`StockPolicy::Strict`](crate::checkout::StockPolicy).
    /// ```text
    /// Cart: "Dune" x 5
    ///      │
    ///      ▼
    /// stock = 3
    ///      │
    ///      ▼
    /// InsufficientStock { title: "Dune", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole checkout rolled back, cart untouched
    /// ```
    #[error("Insufficient stock for '{title}': available {available}, requested {requested}")]
    InsufficientStock {
        book_id: i64,
        title: String,
        available: i64,
        requested: i64,
    },

    /// The requested order status change is not allowed.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidOrderTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Σ(price × quantity) does not fit in an order total.
    #[error("Order total is too large")]
    TotalTooLarge,

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic or database access runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount above its upper bound.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: Money },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g. a malformed price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
