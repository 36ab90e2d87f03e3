//! Concurrent checkouts against a file database with a real connection pool.

use shelf_core::{CoreError, NewBook, StockPolicy};
use shelf_db::{Database, DbConfig, DbError};
use std::time::Duration;

async fn file_db(dir: &tempfile::TempDir) -> Database {
    Database::new(
        DbConfig::new(dir.path().join("shelf.db"))
            .max_connections(8)
            .busy_timeout(Duration::from_secs(10)),
    )
    .await
    .unwrap()
}

async fn scarce_book(db: &Database, stock: i64) -> i64 {
    let category = db.categories().create("Fantasy").await.unwrap();
    db.books()
        .create(&NewBook {
            category_id: category.id,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            description: String::new(),
            price_cents: 85_000,
            image_url: None,
            stock,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn strict_checkouts_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let book_id = scarce_book(&db, 3).await;

    let mut users = Vec::new();
    for i in 0..8 {
        let user = db.users().create(&format!("buyer{i}"), "pw", false).await.unwrap();
        db.carts().add(user.id, book_id).await.unwrap();
        users.push(user.id);
    }

    let handles: Vec<_> = users
        .into_iter()
        .map(|user_id| {
            let db = db.clone();
            tokio::spawn(async move { db.checkout(StockPolicy::Strict).place_order(user_id).await })
        })
        .collect();

    let mut placed = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(DbError::Domain(CoreError::InsufficientStock { .. })) => refused += 1,
            Err(other) => panic!("unexpected checkout error: {other}"),
        }
    }

    assert_eq!(placed, 3);
    assert_eq!(refused, 5);
    assert_eq!(db.books().get(book_id).await.unwrap().stock, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_to_one_cart_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let book_id = scarce_book(&db, 100).await;
    let user = db.users().create("reader", "pw", false).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.carts().add(user.id, book_id).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cart = db.carts().get(user.id).await.unwrap();
    assert_eq!(cart.item_count(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn double_submit_places_one_order() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let book_id = scarce_book(&db, 10).await;
    let user = db.users().create("reader", "pw", false).await.unwrap();
    db.carts().add(user.id, book_id).await.unwrap();

    let first = {
        let db = db.clone();
        tokio::spawn(async move { db.checkout(StockPolicy::Strict).place_order(user.id).await })
    };
    let second = {
        let db = db.clone();
        tokio::spawn(async move { db.checkout(StockPolicy::Strict).place_order(user.id).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let placed = results.iter().filter(|r| r.is_ok()).count();
    let empty = results
        .iter()
        .filter(|r| matches!(r, Err(DbError::Domain(CoreError::EmptyCart))))
        .count();

    assert_eq!((placed, empty), (1, 1));
    assert_eq!(db.orders().count_for_user(user.id).await.unwrap(), 1);
    assert_eq!(db.books().get(book_id).await.unwrap().stock, 9);
}
