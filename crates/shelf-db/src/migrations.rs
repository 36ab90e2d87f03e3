//! # Database Migrations
//!
//! Embedded SQL migrations for Shelf.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new()                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  _sqlx_migrations table (created on first run)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Embedded files vs applied rows                                        │
//! │       ├── 001_initial_schema.sql ✓ applied                             │
//! │       └── 002_...                ⬜ pending → run, record checksum      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Add `migrations/sqlite/NNN_description.sql` with the next number
//! 2. **NEVER** edit an applied migration; checksums are verified

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded from `migrations/sqlite` at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent; each migration runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts for health reporting.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((total, applied as usize))
}
