//! # Checkout Engine
//!
//! The cart → sale state machine. This is the one part of the system with
//! real invariants, so the whole mutation phase runs in a single database
//! transaction.
//!
//! ## Transition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                checkout(cart_id, payment, customer)                     │
//! │                                                                         │
//! │  Phase 1: validate against a loaded snapshot (no mutation)             │
//! │  ─────────────────────────────────────────────────────────             │
//! │   1. load cart + items          → NotFound                             │
//! │   2. items empty?               → "Cart is empty"                      │
//! │   3. status ≠ open?             → "Cart is already completed"          │
//! │   4. payment method known?      → validation error                     │
//! │   5. cash covers total?         → "Insufficient cash amount"           │
//! │                                                                         │
//! │  Phase 2: one transaction (all-or-nothing)                             │
//! │  ─────────────────────────────────────────                             │
//! │   6. claim cart: open → completed, conditional   ──┐                   │
//! │   7. per line: conditional stock decrement         │ any failure       │
//! │   8. insert sale + frozen item snapshots           │ rolls back        │
//! │   9. delete cart row (items cascade)             ──┘ every step        │
//! │  10. COMMIT                                                            │
//! │                                                                         │
//! │  The conditional claim in step 6 is the at-most-once gate: of any      │
//! │  number of concurrent checkouts for one cart, exactly one sees the     │
//! │  open → completed transition succeed.                                  │
//! │                                                                         │
//! │  A refused decrement in step 7 aborts the transaction, so earlier      │
//! │  lines' decrements never survive a mid-cart stock failure.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No retries: checkout is a single user-triggered synchronous operation,
//! and every failure is terminal for that request.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use tillpoint_core::{
    tender, CartStatus, CoreError, Money, PaymentMethod, Principal, Sale, SaleItem, Tender,
    DEFAULT_CUSTOMER,
};
use tillpoint_db::Database;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Checkout request as it arrives from the presentation boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cart_id: String,
    /// Wire string: one of `cash`, `card`, `mobile money`, `bank transfer`.
    pub payment_method: Option<String>,
    /// Amount tendered in cents. Required for cash, optional otherwise.
    pub amount_paid_cents: Option<i64>,
    /// Free-text customer name; blank falls back to the walk-in default.
    pub customer: Option<String>,
}

/// What a successful checkout returns: the recorded sale plus a receipt
/// projection of the same data, reshaped for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub receipt: Receipt,
}

/// Receipt projection of a sale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub sale_id: String,
    pub items: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub amount_paid_cents: i64,
    pub change_cents: i64,
    pub cashier_id: String,
    pub date: chrono::DateTime<Utc>,
}

/// One receipt line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub line_total_cents: i64,
}

// =============================================================================
// Checkout Engine
// =============================================================================

/// Drives the cart → sale transition.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    db: Database,
}

impl CheckoutEngine {
    /// Creates a new CheckoutEngine.
    pub fn new(db: Database) -> Self {
        CheckoutEngine { db }
    }

    /// Checks out a cart: validates, decrements stock, records the sale,
    /// and consumes the cart. See the module docs for the full transition.
    pub async fn checkout(
        &self,
        principal: &Principal,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, ApiError> {
        debug!(cart_id = %request.cart_id, cashier_id = %principal.id, "checkout requested");

        // ---------------------------------------------------------------------
        // Phase 1: validation against the loaded snapshot. Nothing below
        // mutates until every check has passed.
        // ---------------------------------------------------------------------

        let carts = self.db.carts();
        let cart = carts
            .get_by_id(&request.cart_id)
            .await?
            .ok_or_else(|| CoreError::CartNotFound(request.cart_id.clone()))?;

        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        if cart.status != CartStatus::Open {
            return Err(CoreError::CartNotOpen.into());
        }

        let method: PaymentMethod = match request.payment_method.as_deref() {
            None | Some("") => return Err(ApiError::validation("Payment method is required")),
            Some(raw) => raw.parse()?,
        };

        let tender = Tender::new(method, request.amount_paid_cents.map(Money::from_cents));
        let settlement = tender::settle(cart.total(), &tender)?;

        let customer = match request.customer.as_deref() {
            Some(raw) => {
                let trimmed = tillpoint_core::validation::validate_customer_name(raw)
                    .map_err(CoreError::from)?;
                if trimmed.is_empty() {
                    DEFAULT_CUSTOMER.to_string()
                } else {
                    trimmed
                }
            }
            None => DEFAULT_CUSTOMER.to_string(),
        };

        // Sale record materialized from the cart snapshot. Line items carry
        // the frozen name/price/cover image captured at add-to-cart time.
        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            cashier_id: cart.cashier_id.clone(),
            customer,
            subtotal_cents: cart.subtotal_cents,
            tax_cents: cart.tax_cents,
            total_cents: cart.total_cents,
            payment_method: method,
            amount_paid_cents: settlement.amount_paid.cents(),
            change_cents: settlement.change.cents(),
            created_at: now,
        };

        let sale_items: Vec<SaleItem> = cart
            .items
            .iter()
            .map(|item| SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                price_cents: item.price_cents,
                quantity: item.quantity,
                line_total_cents: item.line_total_cents,
                cover_image: item.cover_image.clone(),
            })
            .collect();

        // ---------------------------------------------------------------------
        // Phase 2: the transaction. Claim, decrement, record, consume.
        // Dropping `tx` on any error path rolls back every prior step.
        // ---------------------------------------------------------------------

        let products = self.db.products();
        let sales = self.db.sales();
        let mut tx = self.db.begin().await?;

        // At-most-once gate: only one concurrent checkout wins this update.
        if !carts.claim_for_checkout(&mut tx, &cart.id).await? {
            return Err(CoreError::CartNotOpen.into());
        }

        // Stock validation and decrement in one conditional statement per
        // line: the live quantity is re-read by the WHERE clause itself, so
        // a stale cart snapshot can never oversell.
        for item in &cart.items {
            let decremented = products
                .decrement_stock(&mut tx, &item.product_id, item.quantity)
                .await?;

            if !decremented {
                let available = products.stock_level(&mut tx, &item.product_id).await?;
                let err = match available {
                    Some(available) => CoreError::InsufficientStock {
                        name: item.name.clone(),
                        available,
                        requested: item.quantity,
                    },
                    // Product was deleted while the cart was open
                    None => CoreError::ProductNotFound(item.product_id.clone()),
                };
                return Err(err.into());
            }
        }

        sales.insert(&mut tx, &sale, &sale_items).await?;

        // The cart row only exists while a sale is in progress; once the
        // sale is materialized the row (and its items, via cascade) go away.
        carts.delete(&mut tx, &cart.id).await?;

        tx.commit()
            .await
            .map_err(|e| ApiError::internal(format!("checkout commit failed: {}", e)))?;

        info!(
            sale_id = %sale.id,
            cart_id = %cart.id,
            total = %sale.total_cents,
            change = %sale.change_cents,
            method = %sale.payment_method,
            "Checkout complete"
        );

        let receipt = Receipt {
            sale_id: sale.id.clone(),
            items: sale_items
                .iter()
                .map(|i| ReceiptLine {
                    name: i.name.clone(),
                    quantity: i.quantity,
                    price_cents: i.price_cents,
                    line_total_cents: i.line_total_cents,
                })
                .collect(),
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            payment_method: sale.payment_method,
            amount_paid_cents: sale.amount_paid_cents,
            change_cents: sale.change_cents,
            cashier_id: sale.cashier_id.clone(),
            date: sale.created_at,
        };

        Ok(CheckoutOutcome {
            sale,
            items: sale_items,
            receipt,
        })
    }
}
