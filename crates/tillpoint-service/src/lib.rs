//! # tillpoint-service: Orchestration Layer
//!
//! Wires the pure business logic in `tillpoint-core` to the storage layer in
//! `tillpoint-db` and exposes the operations a presentation layer calls.
//!
//! ## Module Organization
//! ```text
//! tillpoint_service/
//! ├── lib.rs        ◄─── You are here (exports)
//! ├── cart.rs       ◄─── CartService: open-cart resolution + mutations
//! ├── checkout.rs   ◄─── CheckoutEngine: the cart → sale state machine
//! ├── sales.rs      ◄─── SaleQueries: history + role-based projection
//! ├── response.rs   ◄─── success/error response envelope
//! └── error.rs      ◄─── ApiError for callers
//! ```
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tillpoint Request Flow                             │
//! │                                                                         │
//! │  Presentation boundary (HTTP adapter, CLI, tests)                      │
//! │       │   supplies a Principal { id, role } from the identity          │
//! │       │   collaborator; never authenticated here                       │
//! │       ▼                                                                 │
//! │  CartService ──────────► tillpoint-core Cart aggregate (pure math)     │
//! │  CheckoutEngine ───────► one transaction: claim cart, decrement        │
//! │       │                  stock, record sale, drop cart                 │
//! │  SaleQueries ──────────► projections shaped by caller role             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tillpoint-db repositories (SQLite)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod checkout;
pub mod error;
pub mod response;
pub mod sales;

pub use cart::{CartService, CartSummary, CartView};
pub use checkout::{CheckoutEngine, CheckoutOutcome, CheckoutRequest, Receipt, ReceiptLine};
pub use error::{ApiError, ErrorCode};
pub use response::{ApiResponse, ErrorResponse};
pub use sales::{SaleDetail, SaleQueries, SaleSummary};
