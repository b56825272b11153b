//! # Cart Aggregate
//!
//! The mutable pre-sale basket for one cashier.
//!
//! ## Aggregate Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Totals Invariant                                │
//! │                                                                         │
//! │  items[i].line_total = items[i].price × items[i].quantity              │
//! │  subtotal            = Σ items[i].line_total                           │
//! │  total_quantity      = Σ items[i].quantity                             │
//! │  tax                 = subtotal × 7.5%  (rounded to the cent)          │
//! │  total               = subtotal + tax                                  │
//! │                                                                         │
//! │  Every structural mutation (add / adjust / remove / clear) runs        │
//! │  recalculate_totals() before the aggregate is handed back, so a cart   │
//! │  can never be persisted with stale aggregates. No other code path      │
//! │  sets the totals fields.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Freezing
//! A line item is a snapshot of the product at the moment it was added
//! (name, price, cover image). Later product edits do not retroactively
//! change an in-progress cart; checkout copies the same snapshot into the
//! sale record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartStatus, Product, TaxRate};
use crate::{MAX_ITEM_QUANTITY, TAX_RATE_BPS};

// =============================================================================
// Cart Item
// =============================================================================

/// A line item in the cart: a frozen snapshot of a product plus a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product ID (UUID). Weak reference for re-reading live stock at
    /// checkout; everything else on this item is frozen.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Unit price in cents at time of adding (frozen).
    pub price_cents: i64,

    /// Cover image reference at time of adding (frozen).
    pub cover_image: String,

    /// Quantity in cart. Always >= 1.
    pub quantity: i64,

    /// Line total (price × quantity), maintained by recalculate_totals.
    pub line_total_cents: i64,
}

impl CartItem {
    /// Creates a new cart item from a product and quantity.
    ///
    /// ## Price Freezing
    /// The price is captured at this moment. If the product price changes
    /// in the catalog, this cart item retains the original price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price_cents: product.price_cents,
            cover_image: product.cover_image.clone(),
            quantity,
            line_total_cents: product.price_cents * quantity,
        }
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart aggregate: ordered line items plus derived totals.
///
/// One cashier has at most one open cart at a time (the storage layer
/// enforces this with a unique index). The cart is created lazily on the
/// first add, mutated through the methods below, and terminated either by
/// checkout (consumed and deleted) or explicit cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning cashier. Weak reference to the identity system.
    pub cashier_id: String,

    /// Lifecycle status. Only `open` carts accept mutations.
    pub status: CartStatus,

    /// Ordered line items.
    pub items: Vec<CartItem>,

    /// Sum of line quantities.
    pub total_quantity: i64,

    /// Sum of line totals, in cents.
    pub subtotal_cents: i64,

    /// Tax on the subtotal, in cents.
    pub tax_cents: i64,

    /// subtotal + tax, in cents.
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty open cart for a cashier.
    pub fn new(cashier_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Cart {
            id: Uuid::new_v4().to_string(),
            cashier_id: cashier_id.into(),
            status: CartStatus::Open,
            items: Vec::new(),
            total_quantity: 0,
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks if the cart has no line items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of distinct line items.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Adds a product to the cart, merging with an existing line if the
    /// product is already present.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity increases on the existing line
    /// - Otherwise: a new snapshot line is appended (price frozen now)
    ///
    /// ## Errors
    /// - `Validation(QuantityTooSmall)` for quantity < 1
    /// - `Validation(OutOfRange)` when a line would exceed the per-item cap
    /// - `CartNotOpen` if the cart has left the open state
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        self.ensure_open()?;
        crate::validation::validate_quantity(quantity)?;

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id)
        {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
            item.quantity = new_qty;
        } else {
            self.items.push(CartItem::from_product(product, quantity));
        }

        self.recalculate_totals();
        Ok(())
    }

    /// Adjusts an existing line's quantity by a signed delta.
    ///
    /// Deliberately additive rather than absolute: ringing up "+2" on a line
    /// holding 3 yields 5. A delta that would push the quantity below 1 is
    /// rejected; use [`Cart::remove_item`] to drop a line entirely.
    pub fn adjust_quantity(&mut self, product_id: &str, delta: i64) -> CoreResult<()> {
        self.ensure_open()?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ItemNotInCart(product_id.to_string()))?;

        let new_qty = item.quantity + delta;
        if new_qty < 1 {
            return Err(ValidationError::QuantityTooSmall.into());
        }
        if new_qty > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }

        item.quantity = new_qty;
        self.recalculate_totals();
        Ok(())
    }

    /// Removes a line item by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        self.ensure_open()?;

        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            return Err(CoreError::ItemNotInCart(product_id.to_string()));
        }

        self.recalculate_totals();
        Ok(())
    }

    /// Clears all items from the cart.
    ///
    /// Idempotent: clearing an already-empty cart succeeds without
    /// mutation. Returns whether anything was actually removed.
    pub fn clear(&mut self) -> CoreResult<bool> {
        self.ensure_open()?;

        if self.items.is_empty() {
            return Ok(false);
        }

        self.items.clear();
        self.recalculate_totals();
        Ok(true)
    }

    /// Recomputes every derived field from the current line items.
    ///
    /// This is the single source of truth for totals. Each mutation method
    /// calls it before returning, so callers persisting the aggregate always
    /// see reconciled numbers.
    pub fn recalculate_totals(&mut self) {
        let mut subtotal: i64 = 0;
        let mut total_quantity: i64 = 0;

        for item in &mut self.items {
            item.line_total_cents = item.price_cents * item.quantity;
            subtotal += item.line_total_cents;
            total_quantity += item.quantity;
        }

        self.subtotal_cents = subtotal;
        self.total_quantity = total_quantity;

        let tax = Money::from_cents(subtotal).calculate_tax(TaxRate::from_bps(TAX_RATE_BPS));
        self.tax_cents = tax.cents();
        self.total_cents = subtotal + self.tax_cents;
        self.updated_at = Utc::now();
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.status != CartStatus::Open {
            return Err(CoreError::CartNotOpen);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            sku: format!("SKU-{}", id),
            quantity: stock,
            price_cents,
            category: "test".to_string(),
            cover_image: format!("images/{}.jpg", id),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_item_computes_totals() {
        let mut cart = Cart::new("cashier-1");
        let product = test_product("p1", 1000, 10);

        cart.add_item(&product, 2).unwrap();

        // One line: 2 × $10.00 = $20.00, tax $1.50, total $21.50
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.subtotal_cents, 2000);
        assert_eq!(cart.tax_cents, 150);
        assert_eq!(cart.total_cents, 2150);
    }

    #[test]
    fn test_add_same_product_merges_line() {
        let mut cart = Cart::new("cashier-1");
        let product = test_product("p1", 999, 10);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1); // still one line
        assert_eq!(cart.total_quantity, 5);
        assert_eq!(cart.subtotal_cents, 4995);
    }

    #[test]
    fn test_price_frozen_at_add_time() {
        let mut cart = Cart::new("cashier-1");
        let mut product = test_product("p1", 500, 10);

        cart.add_item(&product, 1).unwrap();

        // Price edit after the item is in the cart
        product.price_cents = 900;
        cart.recalculate_totals();

        assert_eq!(cart.items[0].price_cents, 500);
        assert_eq!(cart.subtotal_cents, 500);
    }

    #[test]
    fn test_adjust_quantity_is_additive() {
        let mut cart = Cart::new("cashier-1");
        let product = test_product("p1", 250, 10);
        cart.add_item(&product, 3).unwrap();

        cart.adjust_quantity("p1", 2).unwrap();
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].line_total_cents, 1250);

        cart.adjust_quantity("p1", -4).unwrap();
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[test]
    fn test_adjust_quantity_below_one_rejected() {
        let mut cart = Cart::new("cashier-1");
        let product = test_product("p1", 250, 10);
        cart.add_item(&product, 2).unwrap();

        let err = cart.adjust_quantity("p1", -2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::QuantityTooSmall)
        ));
        // Quantity unchanged after the failed adjustment
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn test_adjust_missing_item() {
        let mut cart = Cart::new("cashier-1");
        let err = cart.adjust_quantity("ghost", 1).unwrap_err();
        assert!(matches!(err, CoreError::ItemNotInCart(_)));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new("cashier-1");
        let a = test_product("a", 100, 10);
        let b = test_product("b", 200, 10);
        cart.add_item(&a, 1).unwrap();
        cart.add_item(&b, 2).unwrap();

        cart.remove_item("a").unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal_cents, 400);
        assert!(matches!(
            cart.remove_item("a").unwrap_err(),
            CoreError::ItemNotInCart(_)
        ));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::new("cashier-1");
        let product = test_product("p1", 100, 10);
        cart.add_item(&product, 2).unwrap();

        assert!(cart.clear().unwrap());
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal_cents, 0);
        assert_eq!(cart.tax_cents, 0);
        assert_eq!(cart.total_cents, 0);
        assert_eq!(cart.total_quantity, 0);

        // Second clear reports success without mutating anything
        assert!(!cart.clear().unwrap());
    }

    #[test]
    fn test_totals_reconcile_over_mixed_mutations() {
        let mut cart = Cart::new("cashier-1");
        let a = test_product("a", 199, 50);
        let b = test_product("b", 1049, 50);
        let c = test_product("c", 75, 50);

        cart.add_item(&a, 3).unwrap();
        cart.add_item(&b, 1).unwrap();
        cart.add_item(&c, 7).unwrap();
        cart.adjust_quantity("a", 2).unwrap();
        cart.remove_item("c").unwrap();
        cart.adjust_quantity("b", 4).unwrap();

        let expected_subtotal: i64 = cart.items.iter().map(|i| i.price_cents * i.quantity).sum();
        let expected_qty: i64 = cart.items.iter().map(|i| i.quantity).sum();
        let expected_tax = (expected_subtotal as i128 * 750 + 5000) / 10000;

        assert_eq!(cart.subtotal_cents, expected_subtotal);
        assert_eq!(cart.total_quantity, expected_qty);
        assert_eq!(cart.tax_cents, expected_tax as i64);
        assert_eq!(cart.total_cents, expected_subtotal + expected_tax as i64);
    }

    #[test]
    fn test_mutation_rejected_when_not_open() {
        let mut cart = Cart::new("cashier-1");
        let product = test_product("p1", 100, 10);
        cart.add_item(&product, 1).unwrap();
        cart.status = CartStatus::Completed;

        assert!(matches!(
            cart.add_item(&product, 1).unwrap_err(),
            CoreError::CartNotOpen
        ));
        assert!(matches!(cart.clear().unwrap_err(), CoreError::CartNotOpen));
    }
}
