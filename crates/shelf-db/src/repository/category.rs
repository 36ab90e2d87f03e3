//! # Category Repository
//!
//! Catalog sections. Deleting a category removes its books (ON DELETE CASCADE).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::validation::validate_category_title;
use shelf_core::{Category, CoreError};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, title FROM categories ORDER BY title COLLATE NOCASE, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by ID.
    pub async fn get(&self, id: i64) -> DbResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, title FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Finds a category by exact title.
    pub async fn find_by_title(&self, title: &str) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, title FROM categories WHERE title = ?1")
                .bind(title.trim())
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for an empty or overlong title
    /// - `UniqueViolation` when the title is taken
    pub async fn create(&self, title: &str) -> DbResult<Category> {
        validate_category_title(title).map_err(CoreError::from)?;
        let title = title.trim();

        debug!(title = %title, "Creating category");

        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (title) VALUES (?1) RETURNING id, title",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_title(e, title))
    }

    /// Renames a category.
    pub async fn update(&self, id: i64, title: &str) -> DbResult<Category> {
        validate_category_title(title).map_err(CoreError::from)?;
        let title = title.trim();

        debug!(id, title = %title, "Updating category");

        sqlx::query_as::<_, Category>(
            "UPDATE categories SET title = ?1 WHERE id = ?2 RETURNING id, title",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_title(e, title))?
        .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category and, through the foreign key, all its books.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

/// Reports a unique violation on `categories.title` with the offending value.
fn duplicate_title(err: sqlx::Error, title: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("category", title),
        other => other,
    }
}
