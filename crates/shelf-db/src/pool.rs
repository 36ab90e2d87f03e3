//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  shelf-api startup                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Readers run in parallel (WAL).                                        │
//! │  Writers queue on the SQLite write lock for up to busy_timeout.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shelf_core::StockPolicy;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::checkout::Checkout;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    BookRepository, CartRepository, CategoryRepository, FavoriteRepository, OrderRepository,
    ReviewRepository, UserRepository,
};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust
/// use shelf_db::DbConfig;
/// use std::time::Duration;
///
/// let config = DbConfig::new("/var/lib/shelf/shelf.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_connections, 8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file. Ignored for in-memory databases.
    pub database_path: PathBuf,

    /// Use a private in-memory database.
    pub in_memory: bool,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a free pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// How long a writer waits on the SQLite lock before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new file-backed configuration. The file is created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            in_memory: false,
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// the database lives only as long as that connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            in_memory: true,
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets how long writers wait on a locked database.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap; all clones share one pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("shelf.db")).await?;
///
/// let page = db.books().list(&BookQuery::default()).await?;
/// db.carts().add(user.id, book_id).await?;
/// let order = db.checkout(StockPolicy::Strict).place_order(user.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads (file databases)
    ///    - NORMAL synchronous
    ///    - Foreign keys enabled
    ///    - Busy timeout so writers queue instead of failing
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let (connect_options, pool_options) = if config.in_memory {
            info!("Initializing in-memory database");

            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .foreign_keys(true)
                .busy_timeout(config.busy_timeout);

            // The database disappears with its connection: never let the pool drop it.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(None)
                .max_lifetime(None);

            (options, pool)
        } else {
            info!(
                path = %config.database_path.display(),
                "Initializing database connection"
            );

            let options = SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .foreign_keys(true)
                .busy_timeout(config.busy_timeout);

            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(Some(config.idle_timeout));

            (options, pool)
        };

        debug!(
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Connection options configured"
        );

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the category repository.
    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Returns the book repository.
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    /// Returns the user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Returns the cart repository.
    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    /// Returns the order repository.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Returns the review repository.
    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    /// Returns the favorite repository.
    pub fn favorites(&self) -> FavoriteRepository {
        FavoriteRepository::new(self.pool.clone())
    }

    /// Returns the checkout workflow bound to a stock policy.
    pub fn checkout(&self, policy: StockPolicy) -> Checkout {
        Checkout::new(self.pool.clone(), policy)
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
