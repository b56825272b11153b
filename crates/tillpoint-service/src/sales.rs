//! # Sale Queries
//!
//! Read-side access to the sale history, with role-based projection.
//!
//! ## Field Visibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Who Sees What                                          │
//! │                                                                         │
//! │  admin                         cashier                                  │
//! │  ─────                         ───────                                  │
//! │  every sale                    own sales only                           │
//! │  cashier field included        cashier field omitted                    │
//! │  may filter by cashier         filter ignored (forced to self)          │
//! │                                                                         │
//! │  Detail view adds an ownership check: a cashier asking for another     │
//! │  cashier's sale gets Forbidden, not an empty projection.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Visibility is a projection decision made here, in one place, instead of
//! conditionally mutating queries: the repository always returns the full
//! row, and `project()` decides which fields survive serialization.

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use tillpoint_core::{CoreError, PaymentMethod, Principal, Role, Sale, SaleItem};
use tillpoint_db::Database;

// =============================================================================
// Projections
// =============================================================================

/// Sale header projection for listings (items omitted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub id: String,
    pub customer: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub amount_paid_cents: i64,
    pub change_cents: i64,
    /// Present only in admin projections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cashier_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SaleSummary {
    /// Projects a sale header for the given caller role.
    pub fn project(sale: Sale, role: Role) -> Self {
        let cashier_id = match role {
            Role::Admin => Some(sale.cashier_id),
            Role::Cashier => None,
        };

        SaleSummary {
            id: sale.id,
            customer: sale.customer,
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            payment_method: sale.payment_method,
            amount_paid_cents: sale.amount_paid_cents,
            change_cents: sale.change_cents,
            cashier_id,
            created_at: sale.created_at,
        }
    }
}

/// Full sale projection with item snapshots (receipt reprint, audit).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub id: String,
    pub customer: String,
    pub items: Vec<SaleItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub amount_paid_cents: i64,
    pub change_cents: i64,
    /// Present only in admin projections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cashier_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SaleDetail {
    /// Projects a full sale for the given caller role.
    pub fn project(sale: Sale, items: Vec<SaleItem>, role: Role) -> Self {
        let cashier_id = match role {
            Role::Admin => Some(sale.cashier_id),
            Role::Cashier => None,
        };

        SaleDetail {
            id: sale.id,
            customer: sale.customer,
            items,
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            payment_method: sale.payment_method,
            amount_paid_cents: sale.amount_paid_cents,
            change_cents: sale.change_cents,
            cashier_id,
            created_at: sale.created_at,
        }
    }
}

// =============================================================================
// Sale Queries
// =============================================================================

/// Read-side sale operations.
#[derive(Debug, Clone)]
pub struct SaleQueries {
    db: Database,
}

impl SaleQueries {
    /// Creates a new SaleQueries.
    pub fn new(db: Database) -> Self {
        SaleQueries { db }
    }

    /// Lists sale headers, newest first.
    ///
    /// Admins see everything and may narrow to one cashier; cashiers always
    /// and only see their own sales, whatever filter they pass.
    pub async fn list_sales(
        &self,
        principal: &Principal,
        cashier_filter: Option<&str>,
    ) -> Result<Vec<SaleSummary>, ApiError> {
        debug!(caller = %principal.id, ?cashier_filter, "list_sales");

        let scope = if principal.is_admin() {
            cashier_filter
        } else {
            Some(principal.id.as_str())
        };

        let sales = self.db.sales().list(scope).await?;

        Ok(sales
            .into_iter()
            .map(|sale| SaleSummary::project(sale, principal.role))
            .collect())
    }

    /// Fetches one sale with its item snapshots.
    ///
    /// ## Errors
    /// - NotFound when no sale has that ID
    /// - Forbidden when a non-admin asks for another cashier's sale
    pub async fn get_sale(
        &self,
        principal: &Principal,
        sale_id: &str,
    ) -> Result<SaleDetail, ApiError> {
        debug!(caller = %principal.id, sale_id = %sale_id, "get_sale");

        let sale = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if !principal.is_admin() && sale.cashier_id != principal.id {
            return Err(CoreError::Forbidden(
                "You are not authorized to view this sale".to_string(),
            )
            .into());
        }

        let items = self.db.sales().get_items(sale_id).await?;

        Ok(SaleDetail::project(sale, items, principal.role))
    }
}
