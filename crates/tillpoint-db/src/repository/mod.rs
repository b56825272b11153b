//! # Repository Module
//!
//! Database repository implementations for Tillpoint.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service call                                                          │
//! │       │                                                                 │
//! │       │  db.products().get_by_id(id)                                   │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, product)                                            │
//! │  └── decrement_stock(&self, conn, id, amount)                          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Can swap database implementations                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//! Methods that take a `&mut SqliteConnection` first argument are meant to
//! run inside a caller-owned transaction (see `Database::begin`); everything
//! else runs on its own pool connection.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD + the stock ledger
//! - [`cart::CartRepository`] - Cart aggregate persistence
//! - [`sale::SaleRepository`] - Immutable sale history

pub mod cart;
pub mod product;
pub mod sale;
