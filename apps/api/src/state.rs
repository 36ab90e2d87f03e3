//! Shared application state.

use shelf_db::{Checkout, Database};

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// State handed to every handler behind an `Arc`.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    /// Builds the state from a connected database and the loaded config.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_access_lifetime_secs);
        AppState { db, jwt, config }
    }

    /// Checkout under the configured stock policy.
    pub fn checkout(&self) -> Checkout {
        self.db.checkout(self.config.stock_policy)
    }
}
