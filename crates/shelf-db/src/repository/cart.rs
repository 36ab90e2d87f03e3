//! # Cart Repository
//!
//! Per-user cart lines.
//!
//! ## Serialization Per Cart
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every cart-mutating transaction starts with a WRITE to the cart row:  │
//! │                                                                         │
//! │    BEGIN                                                               │
//! │    UPDATE carts SET updated_at = ? WHERE user_id = ? RETURNING id      │
//! │         │                                                               │
//! │         └── takes the SQLite write lock before anything is read, so    │
//! │             two add() calls on one cart run one after the other and    │
//! │             neither works from a stale quantity                        │
//! │    SELECT quantity ...                                                 │
//! │    INSERT / UPDATE / DELETE cart_items                                 │
//! │    COMMIT                                                              │
//! │                                                                         │
//! │  A transaction that read first and wrote later could be refused with  │
//! │  SQLITE_BUSY_SNAPSHOT under WAL instead of waiting.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::{Cart, CartLine, CoreError, MAX_ITEM_QUANTITY};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns the user's cart with its lines in insertion order.
    pub async fn get(&self, user_id: i64) -> DbResult<Cart> {
        let cart_id: i64 = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", user_id))?;

        let lines = load_lines(&self.pool, cart_id).await?;

        Ok(Cart {
            id: cart_id,
            user_id,
            lines,
        })
    }

    /// Adds one copy of a book. Returns the line's new quantity.
    ///
    /// ## Errors
    /// - `Domain(BookNotFound)` for an unknown book
    /// - `Domain(QuantityTooLarge)` past 999 copies
    pub async fn add(&self, user_id: i64, book_id: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        let cart_id = lock_cart(&mut tx, user_id).await?;

        let book: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?1")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if book.is_none() {
            return Err(CoreError::BookNotFound(book_id).into());
        }

        let quantity = match current_quantity(&mut tx, cart_id, book_id).await? {
            Some(q) if q >= MAX_ITEM_QUANTITY => {
                return Err(CoreError::QuantityTooLarge {
                    requested: q + 1,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
            Some(q) => {
                sqlx::query(
                    "UPDATE cart_items SET quantity = quantity + 1 WHERE cart_id = ?1 AND book_id = ?2",
                )
                .bind(cart_id)
                .bind(book_id)
                .execute(&mut *tx)
                .await?;
                q + 1
            }
            None => {
                sqlx::query("INSERT INTO cart_items (cart_id, book_id, quantity) VALUES (?1, ?2, 1)")
                    .bind(cart_id)
                    .bind(book_id)
                    .execute(&mut *tx)
                    .await?;
                1
            }
        };

        tx.commit().await?;

        debug!(user_id, book_id, quantity, "Added to cart");
        Ok(quantity)
    }

    /// Removes one copy of a book; deletes the line when it reaches zero.
    ///
    /// Returns the remaining quantity, `0` if the line was deleted.
    pub async fn reduce(&self, user_id: i64, book_id: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        let cart_id = lock_cart(&mut tx, user_id).await?;

        let remaining = match current_quantity(&mut tx, cart_id, book_id).await? {
            None => return Err(CoreError::NotInCart { book_id }.into()),
            Some(q) if q > 1 => {
                sqlx::query(
                    "UPDATE cart_items SET quantity = quantity - 1 WHERE cart_id = ?1 AND book_id = ?2",
                )
                .bind(cart_id)
                .bind(book_id)
                .execute(&mut *tx)
                .await?;
                q - 1
            }
            Some(_) => {
                delete_line(&mut tx, cart_id, book_id).await?;
                0
            }
        };

        tx.commit().await?;

        debug!(user_id, book_id, remaining, "Reduced cart line");
        Ok(remaining)
    }

    /// Deletes a line regardless of its quantity.
    pub async fn remove(&self, user_id: i64, book_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let cart_id = lock_cart(&mut tx, user_id).await?;

        if !delete_line(&mut tx, cart_id, book_id).await? {
            return Err(CoreError::NotInCart { book_id }.into());
        }

        tx.commit().await?;

        debug!(user_id, book_id, "Removed cart line");
        Ok(())
    }
}

// =============================================================================
// Transaction Helpers (shared with checkout)
// =============================================================================

/// Write-locks the user's cart row and returns the cart id.
pub(crate) async fn lock_cart(conn: &mut SqliteConnection, user_id: i64) -> DbResult<i64> {
    sqlx::query_scalar("UPDATE carts SET updated_at = ?1 WHERE user_id = ?2 RETURNING id")
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Cart", user_id))
}

/// Loads a cart's lines joined with the books' current price and stock.
pub(crate) async fn load_lines<'e, E>(executor: E, cart_id: i64) -> DbResult<Vec<CartLine>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let lines = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT
            b.id AS book_id,
            b.title,
            b.author,
            b.image_url,
            b.price_cents,
            b.stock,
            ci.quantity
        FROM cart_items ci
        JOIN books b ON b.id = ci.book_id
        WHERE ci.cart_id = ?1
        ORDER BY ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

async fn current_quantity(
    conn: &mut SqliteConnection,
    cart_id: i64,
    book_id: i64,
) -> DbResult<Option<i64>> {
    let quantity = sqlx::query_scalar("SELECT quantity FROM cart_items WHERE cart_id = ?1 AND book_id = ?2")
        .bind(cart_id)
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(quantity)
}

async fn delete_line(conn: &mut SqliteConnection, cart_id: i64, book_id: i64) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND book_id = ?2")
        .bind(cart_id)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================
