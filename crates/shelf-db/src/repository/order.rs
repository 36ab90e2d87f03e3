//! # Order Repository
//!
//! Reads placed orders and moves them through their status workflow.
//! Orders are only ever created by [`crate::checkout::Checkout`].
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. PLACE        Checkout::place_order() → Order { status: new }       │
//! │                                                                         │
//! │  2. FULFIL       transition(processing) → transition(shipped)          │
//! │                  → transition(completed)                               │
//! │                                                                         │
//! │  3. (OPTIONAL)   transition(cancelled) from new or processing          │
//! │                                                                         │
//! │  Items and total never change after step 1.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use shelf_core::{CoreError, Order, OrderDetail, OrderItem, OrderStatus};

pub(crate) const ORDER_COLUMNS: &str = "id, user_id, status, total_cents, created_at, updated_at";
pub(crate) const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, book_id, title_snapshot, quantity, price_cents";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Lists a user's orders with items, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<OrderDetail>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT oi.id, oi.order_id, oi.book_id, oi.title_snapshot, oi.quantity, oi.price_cents
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = ?1
            ORDER BY oi.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetail { order, items }
            })
            .collect())
    }

    /// Gets any order by ID.
    pub async fn get(&self, order_id: i64) -> DbResult<OrderDetail> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = ?1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let items = self.items(order_id).await?;
        Ok(OrderDetail { order, items })
    }

    /// Gets an order only if it belongs to `user_id`.
    ///
    /// Someone else's order is reported as not found.
    pub async fn get_for_user(&self, user_id: i64, order_id: i64) -> DbResult<OrderDetail> {
        let detail = self.get(order_id).await?;
        if detail.order.user_id != user_id {
            return Err(DbError::not_found("Order", order_id));
        }
        Ok(detail)
    }

    /// Gets an order's items in the order they were written.
    pub async fn items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {} FROM order_items WHERE order_id = ?1 ORDER BY id",
            ORDER_ITEM_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Moves an order to `next` if the workflow allows it.
    ///
    /// Who may ask for which transition is the caller's decision; this only
    /// enforces the workflow itself. The update is conditional on the status
    /// that was checked, so two racing transitions cannot both apply.
    pub async fn transition(&self, order_id: i64, next: OrderStatus) -> DbResult<OrderDetail> {
        let current = self.get(order_id).await?.order.status;

        if !current.can_transition_to(next) {
            return Err(CoreError::InvalidOrderTransition {
                order_id,
                from: current,
                to: next,
            }
            .into());
        }

        let result = sqlx::query(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(next)
        .bind(Utc::now())
        .bind(order_id)
        .bind(current)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Someone else moved it first.
            let now = self.get(order_id).await?.order.status;
            return Err(CoreError::InvalidOrderTransition {
                order_id,
                from: now,
                to: next,
            }
            .into());
        }

        info!(order_id, from = %current, to = %next, "Order status changed");
        self.get(order_id).await
    }

    /// Counts a user's orders.
    pub async fn count_for_user(&self, user_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        debug!(user_id, count, "Counted orders");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_book, seed_category, seed_user, test_db};
    use shelf_core::StockPolicy;

    #[tokio::test]
    async fn test_status_workflow() {
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
        let id = placed.order.id;

        let orders = db.orders();
        assert_eq!(
            orders.transition(id, OrderStatus::Processing).await.unwrap().order.status,
            OrderStatus::Processing
        );
        orders.transition(id, OrderStatus::Shipped).await.unwrap();

        let err = orders.transition(id, OrderStatus::Cancelled).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidOrderTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
                ..
            })
        ));

        orders.transition(id, OrderStatus::Completed).await.unwrap();
        assert!(orders.transition(id, OrderStatus::New).await.is_err());
    }

    #[tokio::test]
    async fn test_other_users_order_is_not_found() {
        let db = test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let cat = seed_category(&db, "Fantasy").await;
        let dune = seed_book(&db, cat.id, "Dune", 85_000, 10).await;

        db.carts().add(alice.id, dune.id).await.unwrap();
        let placed = db
            .checkout(StockPolicy::Strict)
            .place_order(alice.id)
            .await
            .unwrap();

        assert!(db.orders().get_for_user(alice.id, placed.order.id).await.is_ok());
        assert!(db
            .orders()
            .get_for_user(bob.id, placed.order.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(db.orders().list_for_user(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let dune = seed_book(&db, cat.id, "Dune", 85_000, 10).await;
        let checkout = db.checkout(StockPolicy::Strict);

        db.carts().add(user.id, dune.id).await.unwrap();
        let first = checkout.place_order(user.id).await.unwrap();
        db.carts().add(user.id, dune.id).await.unwrap();
        let second = checkout.place_order(user.id).await.unwrap();

        let list = db.orders().list_for_user(user.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].order.id, second.order.id);
        assert_eq!(list[1].order.id, first.order.id);
        assert!(list.iter().all(|o| o.items.len() == 1));
        assert_eq!(db.orders().count_for_user(user.id).await.unwrap(), 2);
    }
}
