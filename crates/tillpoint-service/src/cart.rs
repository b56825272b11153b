//! # Cart Service
//!
//! Cart operations for one cashier's till.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Lifecycle                                    │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌───────────┐     ┌──────────┐      │
//! │  │  (none)  │────►│   Open   │────►│ Completed │────►│ deleted  │      │
//! │  │          │     │          │     │ (claimed) │     │ (gone)   │      │
//! │  └──────────┘     └──────────┘     └───────────┘     └──────────┘      │
//! │       │                │                  checkout engine              │
//! │  get_or_create    add_item                                             │
//! │  _open_cart       adjust_item_quantity      ┌──────────┐              │
//! │                   remove_item          ────►│ Canceled │              │
//! │                   clear                     └──────────┘              │
//! │                        │                     cancel()                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Open-cart resolution is an explicit operation rather than a side effect
//! buried in add-to-cart: callers (and tests) can ask for the handle
//! directly, and the storage-level unique index decides races.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use tillpoint_core::{Cart, CartItem, CoreError, Principal};
use tillpoint_db::Database;

// =============================================================================
// Views
// =============================================================================

/// Totals block shown under the item list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        CartSummary {
            total_items: cart.total_quantity,
            subtotal_cents: cart.subtotal_cents,
            tax_cents: cart.tax_cents,
            total_cents: cart.total_cents,
        }
    }
}

/// Cart response: items plus summary.
///
/// `cart_id` is `None` when the cashier has no open cart yet; the view then
/// carries an empty item list and zeroed summary instead of an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<String>,
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
}

impl CartView {
    fn empty() -> Self {
        CartView {
            cart_id: None,
            items: Vec::new(),
            summary: CartSummary {
                total_items: 0,
                subtotal_cents: 0,
                tax_cents: 0,
                total_cents: 0,
            },
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            cart_id: Some(cart.id.clone()),
            items: cart.items.clone(),
            summary: CartSummary::from(cart),
        }
    }
}

// =============================================================================
// Cart Service
// =============================================================================

/// Cart operations: open-cart resolution plus the four mutations.
///
/// All mutations go through the same shape: load the aggregate, apply the
/// pure core mutation (which recomputes totals), persist, return the view.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    /// Creates a new CartService.
    pub fn new(db: Database) -> Self {
        CartService { db }
    }

    /// Returns the cashier's open cart, creating an empty one if none exists.
    ///
    /// ## Race Handling
    /// Two concurrent calls can both see "no cart" and both insert; the
    /// partial unique index lets exactly one insert through. The loser
    /// re-fetches and returns the winner's cart, so both callers end up
    /// holding the same handle.
    pub async fn get_or_create_open_cart(&self, cashier_id: &str) -> Result<Cart, ApiError> {
        let carts = self.db.carts();

        if let Some(cart) = carts.find_open_by_cashier(cashier_id).await? {
            return Ok(cart);
        }

        let cart = Cart::new(cashier_id);
        match carts.insert(&cart).await {
            Ok(()) => {
                info!(cart_id = %cart.id, cashier_id = %cashier_id, "Opened new cart");
                Ok(cart)
            }
            Err(err) if err.is_unique_violation() => {
                // Lost the creation race; somebody else's insert won
                match carts.find_open_by_cashier(cashier_id).await? {
                    Some(existing) => Ok(existing),
                    None => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Returns the cashier's current cart, or an empty view if none is open.
    pub async fn get_cart(&self, principal: &Principal) -> Result<CartView, ApiError> {
        debug!(cashier_id = %principal.id, "get_cart");

        let cart = self.db.carts().find_open_by_cashier(&principal.id).await?;
        Ok(cart.as_ref().map(CartView::from).unwrap_or_else(CartView::empty))
    }

    /// Adds a product to the caller's open cart, creating the cart lazily.
    ///
    /// ## Behavior
    /// - Product missing from the catalog: NotFound
    /// - Product already in the cart: its line quantity increases
    /// - Otherwise: a new line with a frozen price snapshot is appended
    ///
    /// Totals are recomputed by the aggregate before the cart is persisted.
    pub async fn add_item(
        &self,
        principal: &Principal,
        product_id: &str,
        quantity: Option<i64>,
    ) -> Result<CartView, ApiError> {
        let quantity = quantity.unwrap_or(1);
        debug!(cashier_id = %principal.id, product_id = %product_id, quantity = %quantity, "add_item");

        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let mut cart = self.get_or_create_open_cart(&principal.id).await?;
        cart.add_item(&product, quantity)?;
        self.db.carts().save(&cart).await?;

        info!(cart_id = %cart.id, product_id = %product_id, total = %cart.total_cents, "Item added");
        Ok(CartView::from(&cart))
    }

    /// Adjusts a line's quantity by a signed delta (additive, not absolute).
    ///
    /// ## Errors
    /// - NotFound when the cart or the line is absent
    /// - ValidationError when the resulting quantity would drop below 1
    pub async fn adjust_item_quantity(
        &self,
        cart_id: &str,
        product_id: &str,
        delta: i64,
    ) -> Result<CartView, ApiError> {
        debug!(cart_id = %cart_id, product_id = %product_id, delta = %delta, "adjust_item_quantity");

        let mut cart = self.load_cart(cart_id).await?;
        cart.adjust_quantity(product_id, delta)?;
        self.db.carts().save(&cart).await?;

        Ok(CartView::from(&cart))
    }

    /// Removes a line item entirely.
    pub async fn remove_item(&self, cart_id: &str, product_id: &str) -> Result<CartView, ApiError> {
        debug!(cart_id = %cart_id, product_id = %product_id, "remove_item");

        let mut cart = self.load_cart(cart_id).await?;
        cart.remove_item(product_id)?;
        self.db.carts().save(&cart).await?;

        Ok(CartView::from(&cart))
    }

    /// Empties the cart.
    ///
    /// Idempotent: clearing an already-empty cart reports success without
    /// touching storage.
    pub async fn clear(&self, cart_id: &str) -> Result<CartView, ApiError> {
        debug!(cart_id = %cart_id, "clear");

        let mut cart = self.load_cart(cart_id).await?;
        if cart.clear()? {
            self.db.carts().save(&cart).await?;
        }

        Ok(CartView::from(&cart))
    }

    /// Cancels an open cart without checking it out.
    pub async fn cancel(&self, cart_id: &str) -> Result<(), ApiError> {
        info!(cart_id = %cart_id, "cancel cart");
        self.db.carts().cancel(cart_id).await?;
        Ok(())
    }

    async fn load_cart(&self, cart_id: &str) -> Result<Cart, ApiError> {
        Ok(self
            .db
            .carts()
            .get_by_id(cart_id)
            .await?
            .ok_or_else(|| CoreError::CartNotFound(cart_id.to_string()))?)
    }
}
