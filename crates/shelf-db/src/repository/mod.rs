//! # Repository Module
//!
//! Database repository implementations for Shelf.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.books().list(&query)                                       │
//! │       ▼                                                                 │
//! │  BookRepository                                                        │
//! │  ├── list(&self, query)                                                │
//! │  ├── get(&self, id)                                                    │
//! │  ├── create(&self, new_book)                                           │
//! │  └── update(&self, id, patch)                                          │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository holds a clone of the pool. Multi-statement writes open
//! their own transaction; nothing here spans two repositories except
//! [`crate::checkout`].

pub mod book;
pub mod cart;
pub mod category;
pub mod favorite;
pub mod order;
pub mod review;
pub mod user;

pub use book::BookRepository;
pub use cart::CartRepository;
pub use category::CategoryRepository;
pub use favorite::FavoriteRepository;
pub use order::OrderRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;
