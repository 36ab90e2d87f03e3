//! # Checkout Planning
//!
//! Turns the lines of a cart into the order that checkout will write.
//!
//! ## Where This Fits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Flow                                    │
//! │                                                                         │
//! │  shelf-db (one transaction)            shelf-core (this module)         │
//! │  ─────────────────────────             ────────────────────────         │
//! │                                                                         │
//! │  lock cart row                                                          │
//! │  load cart lines ────────────────────► plan_checkout(lines, policy)    │
//! │                                          ├── empty?  → EmptyCart        │
//! │                                          ├── total = Σ price × qty      │
//! │                                          └── per line: decrement?       │
//! │  insert order + items ◄──────────────── CheckoutPlan                   │
//! │  conditional stock decrements                                           │
//! │  clear cart, commit                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The plan is computed from the stock values read inside the transaction.
//! The database layer still decrements with `WHERE stock >= quantity`, so a
//! plan can never push stock below zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::CartLine;
use crate::validation::validate_quantity;

// =============================================================================
// Stock Policy
// =============================================================================

/// What checkout does when a line asks for more copies than are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Abort the whole checkout with [`CoreError::InsufficientStock`].
    #[default]
    Strict,
    /// Place the order anyway and leave that book's stock untouched.
    BestEffort,
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockPolicy::Strict => f.write_str("strict"),
            StockPolicy::BestEffort => f.write_str("best_effort"),
        }
    }
}

impl FromStr for StockPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StockPolicy::Strict),
            "best_effort" | "best-effort" => Ok(StockPolicy::BestEffort),
            _ => Err(ValidationError::NotAllowed {
                field: "stock_policy".to_string(),
                allowed: vec!["strict".to_string(), "best_effort".to_string()],
            }),
        }
    }
}

// =============================================================================
// Plan
// =============================================================================

/// One order line to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub book_id: i64,
    /// Title frozen into the order item.
    pub title: String,
    pub quantity: i64,
    /// Price frozen into the order item.
    pub unit_price: Money,
    /// Whether stock should be decremented for this line.
    pub decrement: bool,
}

impl PlannedLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Everything checkout writes, computed before any write happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    /// Σ(unit price × quantity) over all lines.
    pub total: Money,
}

impl CheckoutPlan {
    /// Lines whose stock is left alone (best-effort only).
    pub fn skipped(&self) -> impl Iterator<Item = &PlannedLine> {
        self.lines.iter().filter(|l| !l.decrement)
    }
}

/// Plans a checkout from the current cart lines.
///
/// ## Errors
/// - [`CoreError::EmptyCart`] when there are no lines
/// - [`CoreError::Validation`] when a line has an impossible quantity
/// - [`CoreError::TotalTooLarge`] when a line total or the order total
///   overflows
/// - [`CoreError::InsufficientStock`] under [`StockPolicy::Strict`] for the
///   first line whose stock is below its quantity
///
/// ## Example
/// ```rust
/// use shelf_core::{plan_checkout, CartLine, StockPolicy};
///
/// let lines = vec![CartLine {
///     book_id: 1,
///     title: "Dune".into(),
///     author: "Frank Herbert".into(),
///     image_url: None,
///     price_cents: 85_000,
///     stock: 10,
///     quantity: 2,
/// }];
/// let plan = plan_checkout(&lines, StockPolicy::Strict).unwrap();
/// assert_eq!(plan.total.to_string(), "1700.00");
/// ```
pub fn plan_checkout(lines: &[CartLine], policy: StockPolicy) -> CoreResult<CheckoutPlan> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut planned = Vec::with_capacity(lines.len());
    let mut total = Money::zero();

    for line in lines {
        validate_quantity(line.quantity)?;

        let in_stock = line.stock >= line.quantity;
        if !in_stock && policy == StockPolicy::Strict {
            return Err(CoreError::InsufficientStock {
                book_id: line.book_id,
                title: line.title.clone(),
                available: line.stock,
                requested: line.quantity,
            });
        }

        let unit_price = line.unit_price();
        total = unit_price
            .checked_mul(line.quantity)
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or(CoreError::TotalTooLarge)?;
        planned.push(PlannedLine {
            book_id: line.book_id,
            title: line.title.clone(),
            quantity: line.quantity,
            unit_price,
            decrement: in_stock,
        });
    }

    Ok(CheckoutPlan {
        lines: planned,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
