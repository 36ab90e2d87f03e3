//! # Review Repository
//!
//! Ratings and comments on books.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::validation::validate_new_review;
use shelf_core::{CoreError, NewReview, Review};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.book_id, r.user_id, u.username, r.rating, r.text, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id
"#;

/// Repository for review database operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    /// Creates a new ReviewRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReviewRepository { pool }
    }

    /// Posts a review as `user_id`.
    pub async fn create(&self, user_id: i64, review: &NewReview) -> DbResult<Review> {
        validate_new_review(review).map_err(CoreError::from)?;

        let book: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?1")
            .bind(review.book_id)
            .fetch_optional(&self.pool)
            .await?;
        if book.is_none() {
            return Err(CoreError::BookNotFound(review.book_id).into());
        }

        debug!(user_id, book_id = review.book_id, rating = review.rating, "Creating review");

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (book_id, user_id, rating, text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(review.book_id)
        .bind(user_id)
        .bind(review.rating)
        .bind(review.text.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Gets a review by ID.
    pub async fn get(&self, id: i64) -> DbResult<Review> {
        sqlx::query_as::<_, Review>(&format!("{} WHERE r.id = ?1", REVIEW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Review", id))
    }

    /// Lists a book's reviews, newest first.
    pub async fn list_for_book(&self, book_id: i64) -> DbResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{} WHERE r.book_id = ?1 ORDER BY r.created_at DESC, r.id DESC",
            REVIEW_SELECT
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// Deletes a review on behalf of a user.
    ///
    /// Authors may delete their own reviews, superusers any review. Reviews
    /// the caller may not delete are reported as not found.
    pub async fn delete(&self, id: i64, actor_id: i64, actor_is_superuser: bool) -> DbResult<()> {
        let result = if actor_is_superuser {
            sqlx::query("DELETE FROM reviews WHERE id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query("DELETE FROM reviews WHERE id = ?1 AND user_id = ?2")
                .bind(id)
                .bind(actor_id)
                .execute(&self.pool)
                .await?
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Review", id));
        }

        debug!(review_id = id, actor_id, "Deleted review");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_book, seed_category, seed_user, test_db};

    fn review(book_id: i64, rating: i64, text: &str) -> NewReview {
        NewReview {
            book_id,
            rating,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let dune = seed_book(&db, cat.id, "Dune", 85_000, 10).await;

        let first = db.reviews().create(user.id, &review(dune.id, 4, "Good")).await.unwrap();
        let second = db.reviews().create(user.id, &review(dune.id, 5, "Better")).await.unwrap();

        assert_eq!(first.username, "reader");

        let list = db.reviews().list_for_book(dune.id).await.unwrap();
        assert_eq!(
            list.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let detail = db.books().detail(dune.id).await.unwrap();
        assert_eq!(detail.summary.avg_rating, 4.5);
        assert_eq!(detail.reviews.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let db = test_db().await;
        let user = seed_user(&db, "reader").await;
        let cat = seed_category(&db, "Fantasy").await;
        let dune = seed_book(&db, cat.id, "Dune", 85_000, 10).await;

        assert!(matches!(
            db.reviews().create(user.id, &review(dune.id, 6, "Too good")).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));
        assert!(matches!(
            db.reviews().create(user.id, &review(dune.id, 3, " ")).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));
        assert!(db
            .reviews()
            .create(user.id, &review(999, 3, "Ghost book"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_delete_permissions() {
        let db = test_db().await;
        let author = seed_user(&db, "author").await;
        let other = seed_user(&db, "other").await;
        let admin = seed_user(&db, "admin").await;
        let cat = seed_category(&db, "Fantasy").await;
        let dune = seed_book(&db, cat.id, "Dune", 85_000, 10).await;

        let a = db.reviews().create(author.id, &review(dune.id, 4, "Mine")).await.unwrap();
        let b = db.reviews().create(author.id, &review(dune.id, 2, "Also mine")).await.unwrap();

        // Not the author, not staff
        assert!(db.reviews().delete(a.id, other.id, false).await.unwrap_err().is_not_found());

        db.reviews().delete(a.id, author.id, false).await.unwrap();
        db.reviews().delete(b.id, admin.id, true).await.unwrap();

        assert!(db.reviews().list_for_book(dune.id).await.unwrap().is_empty());
    }
}
