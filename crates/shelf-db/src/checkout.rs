//! # Checkout
//!
//! Converts a user's cart into an order in a single transaction.
//!
//! ## Transaction Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                 │
//! │    lock_cart(user)            UPDATE carts ... RETURNING id            │
//! │    load_lines(cart)           current price + stock per line           │
//! │    plan_checkout(lines)       EmptyCart / InsufficientStock → ROLLBACK │
//! │    INSERT orders              status = new, total = Σ price × qty      │
//! │    INSERT order_items         title + price snapshots                  │
//! │    UPDATE books               stock = stock - q WHERE stock >= q       │
//! │    DELETE cart_items                                                   │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before `COMMIT` drops the transaction, which rolls everything
//! back: no order, no stock change, cart untouched.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::repository::cart::{load_lines, lock_cart};
use crate::repository::order::{ORDER_COLUMNS, ORDER_ITEM_COLUMNS};
use shelf_core::{plan_checkout, CoreError, Order, OrderDetail, OrderItem, OrderStatus, StockPolicy};

/// The checkout workflow bound to a stock policy.
#[derive(Debug, Clone)]
pub struct Checkout {
    pool: SqlitePool,
    policy: StockPolicy,
}

impl Checkout {
    /// Creates a checkout that applies `policy` to short stock.
    pub fn new(pool: SqlitePool, policy: StockPolicy) -> Self {
        Checkout { pool, policy }
    }

    /// The stock policy in effect.
    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    /// Places an order from everything in the user's cart.
    ///
    /// ## Errors
    /// - `Domain(EmptyCart)` when the cart has no lines
    /// - `Domain(InsufficientStock)` under the strict policy
    /// - `Domain(TotalTooLarge)` when the order total overflows
    /// - `NotFound` when the user has no cart
    pub async fn place_order(&self, user_id: i64) -> DbResult<OrderDetail> {
        let mut tx = self.pool.begin().await?;

        let cart_id = lock_cart(&mut tx, user_id).await?;
        let lines = load_lines(&mut *tx, cart_id).await?;
        let plan = plan_checkout(&lines, self.policy)?;

        debug!(
            user_id,
            lines = plan.lines.len(),
            total = %plan.total,
            policy = %self.policy,
            "Checkout planned"
        );

        let now = Utc::now();
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (user_id, status, total_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .bind(OrderStatus::New)
        .bind(plan.total.cents())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let item = sqlx::query_as::<_, OrderItem>(&format!(
                r#"
                INSERT INTO order_items (order_id, book_id, title_snapshot, quantity, price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING {}
                "#,
                ORDER_ITEM_COLUMNS
            ))
            .bind(order.id)
            .bind(line.book_id)
            .bind(&line.title)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);

            if !line.decrement {
                warn!(
                    order_id = order.id,
                    book_id = line.book_id,
                    quantity = line.quantity,
                    "Not enough stock, leaving stock unchanged"
                );
                continue;
            }

            let decremented = sqlx::query(
                "UPDATE books SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
            )
            .bind(line.quantity)
            .bind(line.book_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                > 0;

            if decremented {
                continue;
            }

            match self.policy {
                StockPolicy::Strict => {
                    let available: i64 = sqlx::query_scalar("SELECT stock FROM books WHERE id = ?1")
                        .bind(line.book_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .unwrap_or(0);

                    return Err(CoreError::InsufficientStock {
                        book_id: line.book_id,
                        title: line.title.clone(),
                        available,
                        requested: line.quantity,
                    }
                    .into());
                }
                StockPolicy::BestEffort => {
                    warn!(
                        order_id = order.id,
                        book_id = line.book_id,
                        quantity = line.quantity,
                        "Stock changed during checkout, leaving stock unchanged"
                    );
                }
            }
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = order.id,
            user_id,
            total = %order.total(),
            items = items.len(),
            skipped = plan.skipped().count(),
            "Order placed"
        );

        Ok(OrderDetail { order, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::test_support::{seed_book, seed_category, seed_user, test_db};
    use shelf_core::{BookPatch, Money};

    #[tokio::test]
    async fn test_place_order_totals_and_clears_cart() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let a = seed_book(&db, cat.id, "Dune", 85_000, 10).await;
        let b = seed_book(&db, cat.id, "Hyperion", 60_000, 10).await;

        db.carts().add(user.id, a.id).await.unwrap();
        db.carts().add(user.id, a.id).await.unwrap();
        db.carts().add(user.id, b.id).await.unwrap();

        let placed = db
            .checkout(StockPolicy::Strict)
            .place_order(user.id)
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::New);
        assert_eq!(placed.order.total().to_string(), "2300.00");
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.items[0].title_snapshot, "Dune");
        assert_eq!(placed.items[0].quantity, 2);

        assert!(db.carts().get(user.id).await.unwrap().is_empty());
        assert_eq!(db.books().get(a.id).await.unwrap().stock, 8);
        assert_eq!(db.books().get(b.id).await.unwrap().stock, 9);
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;

        let err = db
            .checkout(StockPolicy::Strict)
            .place_order(user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
        assert_eq!(db.orders().count_for_user(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prices_are_snapshotted() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let dune = seed_book(&db, cat.id, "Dune", 85_000, 10).await;

        db.carts().add(user.id, dune.id).await.unwrap();
        let placed = db
            .checkout(StockPolicy::Strict)
            .place_order(user.id)
            .await
            .unwrap();

        db.books()
            .update(
                dune.id,
                &BookPatch {
                    price_cents: Some(99_900),
                    title: Some("Dune (Deluxe)".to_string()),
                    ..BookPatch::default()
                },
            )
            .await
            .unwrap();

        let order = db.orders().get(placed.order.id).await.unwrap();
        assert_eq!(order.order.total(), Money::from_cents(85_000));
        assert_eq!(order.items[0].unit_price(), Money::from_cents(85_000));
        assert_eq!(order.items[0].title_snapshot, "Dune");
    }

    #[tokio::test]
    async fn test_strict_short_stock_rolls_back() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let plenty = seed_book(&db, cat.id, "Dune", 85_000, 10).await;
        let scarce = seed_book(&db, cat.id, "Hyperion", 60_000, 1).await;

        db.carts().add(user.id, plenty.id).await.unwrap();
        db.carts().add(user.id, scarce.id).await.unwrap();
        db.carts().add(user.id, scarce.id).await.unwrap();

        let err = db
            .checkout(StockPolicy::Strict)
            .place_order(user.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));

        assert_eq!(db.orders().count_for_user(user.id).await.unwrap(), 0);
        assert_eq!(db.books().get(plenty.id).await.unwrap().stock, 10);
        assert_eq!(db.books().get(scarce.id).await.unwrap().stock, 1);
        assert_eq!(db.carts().get(user.id).await.unwrap().item_count(), 3);
    }

    #[tokio::test]
    async fn test_best_effort_places_order_without_decrement() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let scarce = seed_book(&db, cat.id, "Hyperion", 60_000, 1).await;

        db.carts().add(user.id, scarce.id).await.unwrap();
        db.carts().add(user.id, scarce.id).await.unwrap();

        let placed = db
            .checkout(StockPolicy::BestEffort)
            .place_order(user.id)
            .await
            .unwrap();

        assert_eq!(placed.order.total(), Money::from_cents(120_000));
        assert_eq!(db.books().get(scarce.id).await.unwrap().stock, 1);
        assert!(db.carts().get(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_total_writes_nothing() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let dune = seed_book(&db, cat.id, "Dune", 85_000, 10).await;

        // A price stored before prices were capped
        sqlx::query("UPDATE books SET price_cents = ?1 WHERE id = ?2")
            .bind(i64::MAX / 2 + 1)
            .bind(dune.id)
            .execute(db.pool())
            .await
            .unwrap();

        db.carts().add(user.id, dune.id).await.unwrap();
        db.carts().add(user.id, dune.id).await.unwrap();

        // The cart view saturates instead of panicking
        let cart = db.carts().get(user.id).await.unwrap();
        assert_eq!(cart.total(), Money::from_cents(i64::MAX));

        let err = db
            .checkout(StockPolicy::Strict)
            .place_order(user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::TotalTooLarge)));

        assert_eq!(db.orders().count_for_user(user.id).await.unwrap(), 0);
        assert_eq!(db.books().get(dune.id).await.unwrap().stock, 10);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(db.carts().get(user.id).await.unwrap().item_count(), 2);
    }
}
