//! # Validation Module
//!
//! Input validation utilities for Shelf.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web frontend                                                 │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity >= 1)                         │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::validation::{validate_rating, validate_quantity};
//!
//! validate_rating(5).unwrap();
//! assert!(validate_quantity(1000).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{BookPatch, NewBook, NewReview, ProfilePatch};
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_RATING, MIN_RATING};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest title, author, category or username accepted.
const MAX_NAME_LEN: usize = 255;

/// Longest accepted search string.
const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Checks that a trimmed text field is present and at most `max` characters.
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_required_text;
///
/// assert!(validate_required_text("title", "Dune", 255).is_ok());
/// assert!(validate_required_text("title", "   ", 255).is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a category title.
pub fn validate_category_title(title: &str) -> ValidationResult<()> {
    validate_required_text("title", title, MAX_NAME_LEN)
}

/// Validates a username.
///
/// ## Rules
/// - 1 to 150 characters
/// - Letters, digits and `@ . + - _` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_required_text("username", username, 150)?;

    if !username
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "may contain only letters, digits and @/./+/-/_".to_string(),
        });
    }

    Ok(())
}

/// Validates a password on registration. Only presence is required.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query, or `None` when it is blank.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units. Zero is allowed.
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(85_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(10_000_000_000).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::TooLarge {
            field: "price".to_string(),
            max: Money::from_cents(MAX_PRICE_CENTS),
        });
    }

    Ok(())
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a review rating (1 to 5 stars).
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: MIN_RATING,
            max: MAX_RATING,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates every field of a new book.
pub fn validate_new_book(book: &NewBook) -> ValidationResult<()> {
    validate_required_text("title", &book.title, MAX_NAME_LEN)?;
    validate_required_text("author", &book.author, MAX_NAME_LEN)?;
    validate_price_cents(book.price_cents)?;
    validate_stock(book.stock)
}

/// Validates the fields present in a book patch.
pub fn validate_book_patch(patch: &BookPatch) -> ValidationResult<()> {
    if let Some(title) = &patch.title {
        validate_required_text("title", title, MAX_NAME_LEN)?;
    }
    if let Some(author) = &patch.author {
        validate_required_text("author", author, MAX_NAME_LEN)?;
    }
    if let Some(price) = patch.price_cents {
        validate_price_cents(price)?;
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
    }
    Ok(())
}

/// Validates a review before it is stored.
pub fn validate_new_review(review: &NewReview) -> ValidationResult<()> {
    validate_rating(review.rating)?;
    if review.text.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "text".to_string(),
        });
    }
    Ok(())
}

/// Validates the fields present in a profile patch.
pub fn validate_profile_patch(patch: &ProfilePatch) -> ValidationResult<()> {
    if let Some(username) = &patch.username {
        validate_username(username)?;
    }
    if let Some(email) = &patch.email {
        let email = email.trim();
        // Blank clears the address.
        if !email.is_empty() && !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "must contain '@'".to_string(),
            });
        }
    }
    for (field, value) in [("first_name", &patch.first_name), ("last_name", &patch.last_name)] {
        if let Some(v) = value {
            if v.chars().count() > 150 {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max: 150,
                });
            }
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
