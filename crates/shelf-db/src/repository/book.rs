//! # Book Repository
//!
//! Database operations for the catalog.
//!
//! ## Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/books?search=dune&category=2&ordering=-price&page=2          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BookQuery { search, category_id, ordering, page, page_size: 12 }      │
//! │       │                                                                 │
//! │       ├──► SELECT COUNT(*) FROM books b WHERE ...        → count        │
//! │       │                                                                 │
//! │       └──► SELECT b.*, AVG(r.rating), COUNT(r.id)                       │
//! │            FROM books b LEFT JOIN reviews r ...                         │
//! │            WHERE ... GROUP BY b.id ORDER BY ... LIMIT 12 OFFSET 12      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Page { count, next: Some(3), previous: Some(1), results }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::review::ReviewRepository;
use shelf_core::validation::{validate_book_patch, validate_new_book};
use shelf_core::{
    Book, BookDetail, BookOrdering, BookPatch, BookQuery, BookSortField, BookSummary, CoreError,
    NewBook, Page,
};

const BOOK_COLUMNS: &str = "id, category_id, title, author, description, price_cents, image_url, stock, created_at";

/// Book columns plus the review aggregate. Callers append WHERE / GROUP BY.
pub(crate) const SUMMARY_SELECT: &str = r#"
    SELECT
        b.id, b.category_id, b.title, b.author, b.description,
        b.price_cents, b.image_url, b.stock, b.created_at,
        COALESCE(AVG(r.rating), 0.0) AS avg_rating,
        COUNT(r.id) AS review_count
    FROM books b
    LEFT JOIN reviews r ON r.book_id = b.id
"#;

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Lists one page of books matching the query.
    pub async fn list(&self, query: &BookQuery) -> DbResult<Page<BookSummary>> {
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);

        debug!(
            search = ?query.search,
            category_id = ?query.category_id,
            page,
            "Listing books"
        );

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM books b");
        push_filters(&mut count_qb, query);
        let count: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(SUMMARY_SELECT);
        push_filters(&mut qb, query);
        qb.push(" GROUP BY b.id ORDER BY ");
        qb.push(order_clause(query.ordering));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page_size));
        qb.push(" OFFSET ");
        qb.push_bind(query.offset());

        let results = qb
            .build_query_as::<BookSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(results, count, page, page_size))
    }

    /// Gets a book by ID.
    pub async fn get(&self, id: i64) -> DbResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::BookNotFound(id).into())
    }

    /// Gets a book with its rating aggregate.
    pub async fn get_summary(&self, id: i64) -> DbResult<BookSummary> {
        sqlx::query_as::<_, BookSummary>(&format!("{} WHERE b.id = ?1 GROUP BY b.id", SUMMARY_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::BookNotFound(id).into())
    }

    /// Gets a book with its rating aggregate and reviews, newest first.
    pub async fn detail(&self, id: i64) -> DbResult<BookDetail> {
        let summary = self.get_summary(id).await?;
        let reviews = ReviewRepository::new(self.pool.clone())
            .list_for_book(id)
            .await?;

        Ok(BookDetail { summary, reviews })
    }

    /// Finds a book by exact title (used by the seeder to stay idempotent).
    pub async fn find_by_title(&self, title: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE title = ?1 ORDER BY id LIMIT 1",
            BOOK_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Counts all books.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Creates a book.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for bad fields
    /// - `NotFound` when the category doesn't exist
    pub async fn create(&self, new_book: &NewBook) -> DbResult<Book> {
        validate_new_book(new_book).map_err(CoreError::from)?;
        self.ensure_category(new_book.category_id).await?;

        debug!(title = %new_book.title, category_id = new_book.category_id, "Creating book");

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (
                category_id, title, author, description,
                price_cents, image_url, stock, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(new_book.category_id)
        .bind(new_book.title.trim())
        .bind(new_book.author.trim())
        .bind(&new_book.description)
        .bind(new_book.price_cents)
        .bind(&new_book.image_url)
        .bind(new_book.stock)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Applies a partial update. Existing order items keep their snapshots.
    pub async fn update(&self, id: i64, patch: &BookPatch) -> DbResult<Book> {
        validate_book_patch(patch).map_err(CoreError::from)?;
        if let Some(category_id) = patch.category_id {
            self.ensure_category(category_id).await?;
        }

        debug!(id, "Updating book");

        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                category_id = COALESCE(?1, category_id),
                title       = COALESCE(?2, title),
                author      = COALESCE(?3, author),
                description = COALESCE(?4, description),
                price_cents = COALESCE(?5, price_cents),
                image_url   = CASE WHEN ?6 THEN ?7 ELSE image_url END,
                stock       = COALESCE(?8, stock)
            WHERE id = ?9
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(patch.category_id)
        .bind(patch.title.as_deref().map(str::trim))
        .bind(patch.author.as_deref().map(str::trim))
        .bind(&patch.description)
        .bind(patch.price_cents)
        .bind(patch.image_url.is_some())
        .bind(patch.image_url.as_ref().and_then(|url| url.as_deref()))
        .bind(patch.stock)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::BookNotFound(id).into())
    }

    /// Deletes a book. Order items that referenced it keep their snapshot.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting book");

        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::BookNotFound(id).into());
        }

        Ok(())
    }

    async fn ensure_category(&self, category_id: i64) -> DbResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?;

        exists
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("Category", category_id))
    }
}

// =============================================================================
// Query Helpers
// =============================================================================

/// Appends the WHERE clause for search and category filters.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &BookQuery) {
    let mut sep = " WHERE ";

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        // LIKE folds ASCII case only; other scripts match as typed.
        let pattern = format!("%{}%", escape_like(search));
        qb.push(sep);
        qb.push("(b.title LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR b.author LIKE ");
        qb.push_bind(pattern);
        qb.push(" ESCAPE '\\')");
        sep = " AND ";
    }

    if let Some(category_id) = query.category_id {
        qb.push(sep);
        qb.push("b.category_id = ");
        qb.push_bind(category_id);
    }
}

/// ORDER BY clause. Only fixed strings reach SQL; id breaks ties.
fn order_clause(ordering: BookOrdering) -> &'static str {
    match (ordering.field, ordering.descending) {
        (BookSortField::Price, false) => "b.price_cents ASC, b.id ASC",
        (BookSortField::Price, true) => "b.price_cents DESC, b.id DESC",
        (BookSortField::CreatedAt, false) => "b.created_at ASC, b.id ASC",
        (BookSortField::CreatedAt, true) => "b.created_at DESC, b.id DESC",
        (BookSortField::AverageRating, false) => "avg_rating ASC, b.id ASC",
        (BookSortField::AverageRating, true) => "avg_rating DESC, b.id DESC",
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
