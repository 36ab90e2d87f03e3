//! End-to-end tests driving the router in-process.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use shelf_api::{build_app, ApiConfig, AppState};
use shelf_core::NewBook;
use shelf_db::{Database, DbConfig};

struct TestApp {
    app: Router,
    db: Database,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig {
            jwt_secret: "test-secret".to_string(),
            ..ApiConfig::default()
        };
        let app = build_app(Arc::new(AppState::new(db.clone(), config)));
        TestApp { app, db }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers and logs in; returns the token.
    async fn login_as(&self, username: &str) -> String {
        let (status, _) = self
            .post("/api/register", None, json!({ "username": username, "password": "pw" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .post("/api/login", None, json!({ "username": username, "password": "pw" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.db.users().create("admin", "pw", true).await.unwrap();
        let (_, body) = self
            .post("/api/login", None, json!({ "username": "admin", "password": "pw" }))
            .await;
        body["token"].as_str().unwrap().to_string()
    }

    async fn book(&self, title: &str, price_cents: i64, stock: i64) -> i64 {
        let category = match self.db.categories().find_by_title("Fiction").await.unwrap() {
            Some(c) => c,
            None => self.db.categories().create("Fiction").await.unwrap(),
        };
        self.db
            .books()
            .create(&NewBook {
                category_id: category.id,
                title: title.to_string(),
                author: "Author".to_string(),
                description: String::new(),
                price_cents,
                image_url: None,
                stock,
            })
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn register_and_login() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/register", None, json!({ "username": "reader", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");

    let (status, body) = app
        .post("/api/register", None, json!({ "username": "reader", "password": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app.post("/api/register", None, json!({ "username": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/login", None, json!({ "username": "reader", "password": "nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .post("/api/login", None, json!({ "username": "reader", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "reader");

    let token = body["token"].as_str().unwrap();
    let (status, profile) = app.get("/api/profile", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "reader");
    assert_eq!(profile["is_superuser"], false);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/cart", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn checkout_happy_path() {
    let app = TestApp::new().await;
    let token = app.login_as("reader").await;
    let a = app.book("Dune", 85_000, 10).await;
    let b = app.book("Hyperion", 60_000, 10).await;

    for id in [a, a, b] {
        let (status, _) = app.post("/api/cart/add", Some(&token), json!({ "book_id": id })).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, cart) = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart["total_price"], "2300.00");

    let (status, order) = app.send(Method::POST, "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "new");
    assert_eq!(order["total_price"], "2300.00");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["items"][0]["book_title"], "Dune");
    assert_eq!(order["items"][0]["price"], "850.00");

    let (_, cart) = app.get("/api/cart", Some(&token)).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (_, book) = app.get(&format!("/api/books/{a}"), None).await;
    assert_eq!(book["stock"], 8);

    let (_, orders) = app.get("/api/orders", Some(&token)).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_empty_cart() {
    let app = TestApp::new().await;
    let token = app.login_as("reader").await;

    let (status, body) = app.send(Method::POST, "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Empty cart" }));
}

#[tokio::test]
async fn checkout_short_stock_is_a_conflict() {
    let app = TestApp::new().await;
    let token = app.login_as("reader").await;
    let scarce = app.book("Hyperion", 60_000, 1).await;

    app.post("/api/cart/add", Some(&token), json!({ "book_id": scarce })).await;
    app.post("/api/cart/add", Some(&token), json!({ "book_id": scarce })).await;

    let (status, body) = app.send(Method::POST, "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (_, cart) = app.get("/api/cart", Some(&token)).await;
    assert_eq!(cart["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn cart_mutations() {
    let app = TestApp::new().await;
    let token = app.login_as("reader").await;
    let dune = app.book("Dune", 85_000, 10).await;

    let (status, body) = app.post("/api/cart/add", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "no id" }));

    let (status, _) = app.post("/api/cart/add", Some(&token), json!({ "book_id": 999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.post("/api/cart/add", Some(&token), json!({ "book_id": dune })).await;
    assert_eq!(body, json!({ "status": "added", "quantity": 1 }));
    let (_, body) = app.post("/api/cart/add", Some(&token), json!({ "book_id": dune })).await;
    assert_eq!(body["quantity"], 2);

    let (_, body) = app
        .post("/api/cart/reduce_quantity", Some(&token), json!({ "book_id": dune }))
        .await;
    assert_eq!(body, json!({ "status": "reduced" }));

    let (_, body) = app
        .post("/api/cart/delete_item", Some(&token), json!({ "book_id": dune }))
        .await;
    assert_eq!(body, json!({ "status": "deleted" }));

    let (status, body) = app
        .post("/api/cart/delete_item", Some(&token), json!({ "book_id": dune }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not in cart" }));
}

#[tokio::test]
async fn book_listing_filters_and_pages() {
    let app = TestApp::new().await;
    for i in 0..13 {
        app.book(&format!("Volume {i}"), 10_000 + i, 5).await;
    }
    app.book("Dune", 85_000, 5).await;

    let (status, page) = app.get("/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 14);
    assert_eq!(page["results"].as_array().unwrap().len(), 12);
    assert_eq!(page["next"], 2);
    assert_eq!(page["previous"], Value::Null);

    let (_, page) = app.get("/api/books?page=2", None).await;
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    assert_eq!(page["previous"], 1);

    let (_, page) = app.get("/api/books?search=DUNE", None).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["price"], "850.00");
    assert_eq!(page["results"][0]["avg_rating"], 0.0);

    let (_, page) = app.get("/api/books?ordering=-price", None).await;
    assert_eq!(page["results"][0]["title"], "Dune");

    let (status, _) = app.get("/api/books?ordering=stock", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_writes_need_superuser() {
    let app = TestApp::new().await;
    let reader = app.login_as("reader").await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .post("/api/categories", Some(&reader), json!({ "title": "Poetry" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, category) = app
        .post("/api/categories", Some(&admin), json!({ "title": "Poetry" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, book) = app
        .post(
            "/api/books",
            Some(&admin),
            json!({
                "category": category["id"],
                "title": "Odes",
                "author": "Keats",
                "price": "12.50"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["price"], "12.50");
    assert_eq!(book["stock"], 10);

    let id = book["id"].as_i64().unwrap();
    let (status, book) = app
        .send(
            Method::PATCH,
            &format!("/api/books/{id}"),
            Some(&admin),
            Some(json!({ "price": 15 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["price"], "15.00");

    let (status, book) = app
        .send(
            Method::PATCH,
            &format!("/api/books/{id}"),
            Some(&admin),
            Some(json!({ "image": "odes.jpg" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["image"], "odes.jpg");

    let (status, book) = app
        .send(
            Method::PATCH,
            &format!("/api/books/{id}"),
            Some(&admin),
            Some(json!({ "image": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(book["image"].is_null());

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/books/{id}"),
            Some(&admin),
            Some(json!({ "price": "92233720368547758.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "price must be at most 99999999.99");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/books/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reviews_and_favorites() {
    let app = TestApp::new().await;
    let author = app.login_as("author").await;
    let other = app.login_as("other").await;
    let dune = app.book("Dune", 85_000, 10).await;

    let (status, review) = app
        .post(
            "/api/reviews",
            Some(&author),
            json!({ "book": dune, "rating": 5, "text": "Spice" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["username"], "author");

    let (status, _) = app
        .post("/api/reviews", Some(&author), json!({ "book": dune, "rating": 9, "text": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, detail) = app.get(&format!("/api/books/{dune}"), None).await;
    assert_eq!(detail["avg_rating"], 5.0);
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 1);

    let review_uri = format!("/api/reviews/{}", review["id"]);
    let (status, _) = app.send(Method::DELETE, &review_uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &review_uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .post("/api/favorites/toggle", Some(&other), json!({ "book_id": dune }))
        .await;
    assert_eq!(body, json!({ "is_favorite": true }));
    let (_, ids) = app.get("/api/favorites/ids", Some(&other)).await;
    assert_eq!(ids, json!([dune]));
    let (_, books) = app.get("/api/favorites", Some(&other)).await;
    assert_eq!(books[0]["title"], "Dune");

    let (_, body) = app
        .post("/api/favorites/toggle", Some(&other), json!({ "book_id": dune }))
        .await;
    assert_eq!(body, json!({ "is_favorite": false }));
}

#[tokio::test]
async fn order_status_permissions() {
    let app = TestApp::new().await;
    let reader = app.login_as("reader").await;
    let admin = app.admin_token().await;
    let dune = app.book("Dune", 85_000, 10).await;

    app.post("/api/cart/add", Some(&reader), json!({ "book_id": dune })).await;
    let (_, order) = app.send(Method::POST, "/api/orders", Some(&reader), None).await;
    let uri = format!("/api/orders/{}", order["id"]);

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&reader), Some(json!({ "status": "processing" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&admin), Some(json!({ "status": "processing" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&admin), Some(json!({ "status": "new" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let other = app.login_as("other").await;
    let (status, _) = app.get(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
