//! # Domain Types
//!
//! Core domain types used throughout Tillpoint.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  sku (business) │   │  cashier_id     │   │  name snapshot  │       │
//! │  │  name           │   │  payment_method │   │  price snapshot │       │
//! │  │  quantity       │   │  change_cents   │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │   CartStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Open           │   │  Cash           │       │
//! │  │  750 = 7.5%     │   │  Completed      │   │  Card           │       │
//! │  └─────────────────┘   │  Canceled       │   │  MobileMoney    │       │
//! │                        └─────────────────┘   │  BankTransfer   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (sku, product name) - human-readable

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 750 bps = 7.5% (the store-wide sales tax)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `quantity` is the stock on hand, owned by the inventory ledger. It is
/// mutated by admin restocks and by the checkout engine's conditional
/// decrement, and must never be negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt. Unique.
    pub name: String,

    /// Stock Keeping Unit - business identifier. Unique.
    pub sku: String,

    /// Units in stock. Never negative.
    pub quantity: i64,

    /// Unit price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Product category (free-form, used for browsing).
    pub category: String,

    /// Cover image reference (URL or storage path). The image itself lives
    /// with the upload/storage collaborator; this is an opaque handle.
    pub cover_image: String,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can be filled from stock.
    #[inline]
    pub fn can_fill(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

// =============================================================================
// Cart Status
// =============================================================================

/// The lifecycle status of a cart.
///
/// Only `open` carts may be mutated or checked out. `completed` is the
/// terminal state a cart passes through during checkout, just before the
/// cart row is deleted; `canceled` records an explicitly abandoned cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    /// Cart is in progress (items being added).
    Open,
    /// Cart was consumed by a successful checkout.
    Completed,
    /// Cart was explicitly abandoned.
    Canceled,
}

impl Default for CartStatus {
    fn default() -> Self {
        CartStatus::Open
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Accepted payment methods.
///
/// The wire strings (`"mobile money"`, `"bank transfer"`) contain spaces;
/// they are the exact values accepted at the API boundary and stored in the
/// `sales` table, so serde and sqlx renames pin them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentMethod {
    /// Physical cash payment. The only method with change.
    #[serde(rename = "cash")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cash"))]
    Cash,
    /// Card payment on an external terminal.
    #[serde(rename = "card")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "card"))]
    Card,
    /// Mobile money transfer.
    #[serde(rename = "mobile money")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "mobile money"))]
    MobileMoney,
    /// Direct bank transfer.
    #[serde(rename = "bank transfer")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bank transfer"))]
    BankTransfer,
}

impl PaymentMethod {
    /// The exact wire string for this method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile money",
            PaymentMethod::BankTransfer => "bank transfer",
        }
    }

    /// Whether this method settles in physical cash (and thus makes change).
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "mobile money" => Ok(PaymentMethod::MobileMoney),
            "bank transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(CoreError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

// =============================================================================
// Principal (identity collaborator boundary)
// =============================================================================

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Cashier,
}

/// The authenticated caller, as supplied by the identity collaborator.
///
/// Cart and checkout operations trust `id` as the cashier identity and do
/// not authenticate it themselves. Authentication, password handling and
/// token issuance all live outside this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    /// Creates a cashier principal.
    pub fn cashier(id: impl Into<String>) -> Self {
        Principal {
            id: id.into(),
            role: Role::Cashier,
        }
    }

    /// Creates an admin principal.
    pub fn admin(id: impl Into<String>) -> Self {
        Principal {
            id: id.into(),
            role: Role::Admin,
        }
    }

    /// Whether this principal holds the admin role.
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once created.
///
/// Created exactly once per successful checkout; never updated or deleted
/// by the normal flow. Line items live in [`SaleItem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// Cashier who rang up the sale. Weak reference to the identity system.
    pub cashier_id: String,
    /// Free-text customer name, defaulting to "Walk-in customer".
    pub customer: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Amount tendered. Always >= total_cents.
    pub amount_paid_cents: i64,
    /// amount_paid - total for cash; 0 for every other method.
    pub change_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Invariant check: tendered amount covers the total.
    #[inline]
    pub fn is_payment_valid(&self) -> bool {
        self.amount_paid_cents >= self.total_cents
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: product name, price and cover image are frozen
/// copies taken from the cart at checkout time, so later product edits never
/// alter sale history. `product_id` is kept for traceability only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Weak reference to the product; the product may be deleted later.
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen).
    pub price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Line total (price × quantity).
    pub line_total_cents: i64,
    /// Cover image reference at time of sale (frozen).
    pub cover_image: String,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(750);
        assert_eq!(rate.bps(), 750);
        assert!((rate.percentage() - 7.5).abs() < 0.001);
    }

    #[test]
    fn test_payment_method_round_trip() {
        for s in ["cash", "card", "mobile money", "bank transfer"] {
            let method: PaymentMethod = s.parse().unwrap();
            assert_eq!(method.as_str(), s);
        }
    }

    #[test]
    fn test_payment_method_rejects_unknown() {
        let err = "cheque".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentMethod(_)));
    }

    #[test]
    fn test_payment_method_wire_json() {
        let json = serde_json::to_string(&PaymentMethod::MobileMoney).unwrap();
        assert_eq!(json, "\"mobile money\"");
    }

    #[test]
    fn test_cart_status_default() {
        assert_eq!(CartStatus::default(), CartStatus::Open);
    }

    #[test]
    fn test_principal_roles() {
        assert!(Principal::admin("a1").is_admin());
        assert!(!Principal::cashier("c1").is_admin());
    }
}
