//! Fixtures shared by the repository tests.

use shelf_core::{Book, Category, NewBook, User};

use crate::pool::{Database, DbConfig};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) async fn seed_category(db: &Database, title: &str) -> Category {
    db.categories().create(title).await.unwrap()
}

pub(crate) fn new_book(category_id: i64, title: &str, price_cents: i64, stock: i64) -> NewBook {
    NewBook {
        category_id,
        title: title.to_string(),
        author: "Author".to_string(),
        description: String::new(),
        price_cents,
        image_url: None,
        stock,
    }
}

pub(crate) async fn seed_book(
    db: &Database,
    category_id: i64,
    title: &str,
    price_cents: i64,
    stock: i64,
) -> Book {
    db.books()
        .create(&new_book(category_id, title, price_cents, stock))
        .await
        .unwrap()
}

pub(crate) async fn seed_user(db: &Database, username: &str) -> User {
    db.users().create(username, "password", false).await.unwrap()
}
