//! # Favorite Repository
//!
//! A user's bookmarked books. One row per (user, book).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::book::SUMMARY_SELECT;
use shelf_core::{BookSummary, CoreError};

/// Repository for favorite database operations.
#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: SqlitePool,
}

impl FavoriteRepository {
    /// Creates a new FavoriteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FavoriteRepository { pool }
    }

    /// Adds the book to favorites if absent, removes it if present.
    ///
    /// Returns whether the book is a favorite afterwards.
    pub async fn toggle(&self, user_id: i64, book_id: i64) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Write first so the check-then-insert below cannot race.
        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = ?1 AND book_id = ?2")
            .bind(user_id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            let book: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?1")
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await?;
            if book.is_none() {
                return Err(CoreError::BookNotFound(book_id).into());
            }

            sqlx::query("INSERT INTO favorites (user_id, book_id, created_at) VALUES (?1, ?2, ?3)")
                .bind(user_id)
                .bind(book_id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let is_favorite = !removed;
        debug!(user_id, book_id, is_favorite, "Toggled favorite");
        Ok(is_favorite)
    }

    /// Lists the user's favorite books, most recently added first.
    pub async fn list_books(&self, user_id: i64) -> DbResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(&format!(
            r#"
            {}
            JOIN favorites f ON f.book_id = b.id
            WHERE f.user_id = ?1
            GROUP BY b.id
            ORDER BY MAX(f.created_at) DESC, b.id DESC
            "#,
            SUMMARY_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Lists the IDs of the user's favorite books.
    pub async fn ids(&self, user_id: i64) -> DbResult<Vec<i64>> {
        let ids = sqlx::query_scalar("SELECT book_id FROM favorites WHERE user_id = ?1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}
