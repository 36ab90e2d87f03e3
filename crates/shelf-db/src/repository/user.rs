//! # User Repository
//!
//! Accounts and credentials.
//!
//! ## Registration
//! ```text
//! create("reader", "pw", false)
//!      │
//!      ▼
//! BEGIN
//!   INSERT INTO users ...  RETURNING id   ── UNIQUE(username) → UniqueViolation
//!   INSERT INTO carts (user_id) ...        ── the user's one cart
//! COMMIT
//! ```
//! Carts are never created lazily: every write path can assume the row exists.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::password::{hash_password, verify_password};
use shelf_core::validation::{validate_password, validate_profile_patch, validate_username};
use shelf_core::{CoreError, ProfilePatch, User};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, is_superuser, created_at";

/// A user row together with its password hash. Never leaves this module.
#[derive(sqlx::FromRow)]
struct UserCredentials {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a user and creates their cart in the same transaction.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for a missing/invalid username or password
    /// - `UniqueViolation` when the username is taken
    pub async fn create(&self, username: &str, password: &str, is_superuser: bool) -> DbResult<User> {
        validate_username(username).map_err(CoreError::from)?;
        validate_password(password).map_err(CoreError::from)?;
        let username = username.trim();

        let password_hash = hash_password(password)?;
        let now = Utc::now();

        debug!(username = %username, is_superuser, "Creating user");

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, is_superuser, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(&password_hash)
        .bind(is_superuser)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_username(e, username))?;

        sqlx::query("INSERT INTO carts (user_id, created_at, updated_at) VALUES (?1, ?2, ?2)")
            .bind(user.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get(&self, id: i64) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Finds a user by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?1",
            USER_COLUMNS
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Checks a username/password pair.
    ///
    /// Returns `None` for an unknown user or a wrong password, without
    /// saying which.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {}, password_hash FROM users WHERE username = ?1",
            USER_COLUMNS
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .filter(|r| verify_password(password, &r.password_hash))
            .map(|r| r.user))
    }

    /// Applies a partial profile update.
    pub async fn update_profile(&self, id: i64, patch: &ProfilePatch) -> DbResult<User> {
        validate_profile_patch(patch).map_err(CoreError::from)?;
        let username = patch.username.as_deref().map(str::trim);

        debug!(user_id = id, "Updating profile");

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                username   = COALESCE(?1, username),
                email      = COALESCE(?2, email),
                first_name = COALESCE(?3, first_name),
                last_name  = COALESCE(?4, last_name)
            WHERE id = ?5
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(patch.email.as_deref().map(str::trim))
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_username(e, username.unwrap_or_default()))?
        .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Grants or revokes staff rights.
    pub async fn set_superuser(&self, id: i64, is_superuser: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_superuser = ?1 WHERE id = ?2")
            .bind(is_superuser)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

fn duplicate_username(err: sqlx::Error, username: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_register_creates_cart() {
        let db = test_db().await;
        let user = db.users().create("reader", "s3cret", false).await.unwrap();

        let cart = db.carts().get(user.id).await.unwrap();
        assert_eq!(cart.user_id, user.id);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = test_db().await;
        db.users().create("reader", "a", false).await.unwrap();

        let err = db.users().create("reader", "b", false).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));

        // The failed registration left no orphan cart behind
        let carts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(carts, 1);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let db = test_db().await;
        assert!(matches!(
            db.users().create("", "pw", false).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));
        assert!(matches!(
            db.users().create("reader", "", false).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = test_db().await;
        let user = db.users().create("reader", "s3cret", false).await.unwrap();

        let ok = db.users().authenticate("reader", "s3cret").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        assert!(db.users().authenticate("reader", "wrong").await.unwrap().is_none());
        assert!(db.users().authenticate("nobody", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = test_db().await;
        let user = db.users().create("reader", "pw", false).await.unwrap();
        db.users().create("taken", "pw", false).await.unwrap();

        let updated = db
            .users()
            .update_profile(
                user.id,
                &ProfilePatch {
                    first_name: Some("Ann".to_string()),
                    email: Some("ann@example.com".to_string()),
                    ..ProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Ann");
        assert_eq!(updated.email, "ann@example.com");
        assert_eq!(updated.username, "reader");

        let err = db
            .users()
            .update_profile(
                user.id,
                &ProfilePatch {
                    username: Some("taken".to_string()),
                    ..ProfilePatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
