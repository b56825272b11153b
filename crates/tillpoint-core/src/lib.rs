//! # tillpoint-core: Pure Business Logic for Tillpoint
//!
//! This crate is the **heart** of Tillpoint. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tillpoint Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tillpoint-service (orchestration)               │   │
//! │  │    CartService ──► CheckoutEngine ──► SaleQueries              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tillpoint-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  tender   │  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │ settle()  │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │ CartItem  │  │  change   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tillpoint-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Principal, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The cart aggregate and its totals invariant
//! - [`tender`] - Payment settlement (amount paid / change)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tillpoint_core::money::Money;
//! use tillpoint_core::types::TaxRate;
//!
//! // Create money from cents (never from floats!)
//! let subtotal = Money::from_cents(2000); // $20.00
//!
//! // Sales tax at the store-wide 7.5% rate
//! let rate = TaxRate::from_bps(tillpoint_core::TAX_RATE_BPS);
//! let tax = subtotal.calculate_tax(rate);
//!
//! assert_eq!(tax.cents(), 150);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod tender;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tillpoint_core::Money` instead of
// `use tillpoint_core::money::Money`

pub use cart::{Cart, CartItem};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use tender::{Settlement, Tender};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Store-wide sales tax rate in basis points (750 = 7.5%).
///
/// Applied to the cart subtotal by [`Cart::recalculate_totals`]. A future
/// per-category or per-tenant rate would replace this constant with
/// configuration, so no code outside this crate hard-codes the number.
pub const TAX_RATE_BPS: u32 = 750;

/// Customer name recorded on a sale when the caller supplies none.
pub const DEFAULT_CUSTOMER: &str = "Walk-in customer";

/// Maximum quantity of a single line item in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
