//! # Sale Repository
//!
//! Database operations for the immutable sale history.
//!
//! ## Write-Once Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. INSERT (checkout transaction only)                                 │
//! │     └── insert() → sale header + frozen item snapshots                 │
//! │                                                                         │
//! │  2. READ (receipts, reporting)                                         │
//! │     ├── get_by_id() / get_items()                                      │
//! │     └── list() → headers only, newest first                            │
//! │                                                                         │
//! │  There is no update or delete: a sale is history the moment it is      │
//! │  written. Corrections happen as new business events, not edits.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tillpoint_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "id, cashier_id, customer, subtotal_cents, tax_cents, total_cents, \
                            payment_method, amount_paid_cents, change_cents, created_at";

const SALE_ITEM_COLUMNS: &str =
    "id, sale_id, product_id, name, price_cents, quantity, line_total_cents, cover_image";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale with its item snapshots on the caller's connection.
    ///
    /// Runs inside the checkout transaction so the sale appears atomically
    /// with the stock decrements and the cart deletion.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        sale: &Sale,
        items: &[SaleItem],
    ) -> DbResult<()> {
        debug!(sale_id = %sale.id, total = %sale.total_cents, items = items.len(), "Recording sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, cashier_id, customer,
                subtotal_cents, tax_cents, total_cents,
                payment_method, amount_paid_cents, change_cents,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.cashier_id)
        .bind(&sale.customer)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.amount_paid_cents)
        .bind(sale.change_cents)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, name, price_cents,
                    quantity, line_total_cents, cover_image, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(&item.cover_image)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all item snapshots for a sale, in ring-up order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sale headers, newest first, optionally filtered to one cashier.
    ///
    /// Items are deliberately not loaded here: listings are for reporting
    /// screens, which page through headers and fetch details on demand.
    pub async fn list(&self, cashier_id: Option<&str>) -> DbResult<Vec<Sale>> {
        let sales = match cashier_id {
            Some(cashier_id) => {
                sqlx::query_as::<_, Sale>(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales WHERE cashier_id = ?1 \
                     ORDER BY created_at DESC"
                ))
                .bind(cashier_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Sale>(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(sales)
    }

    /// Counts recorded sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use tillpoint_core::PaymentMethod;

    fn sample_sale(cashier_id: &str, total_cents: i64) -> Sale {
        Sale {
            id: generate_sale_id(),
            cashier_id: cashier_id.to_string(),
            customer: "Walk-in customer".to_string(),
            subtotal_cents: total_cents,
            tax_cents: 0,
            total_cents,
            payment_method: PaymentMethod::Card,
            amount_paid_cents: total_cents,
            change_cents: 0,
            created_at: Utc::now(),
        }
    }

    fn sample_item(sale_id: &str, product_id: &str, qty: i64) -> SaleItem {
        SaleItem {
            id: generate_sale_item_id(),
            sale_id: sale_id.to_string(),
            product_id: product_id.to_string(),
            name: format!("Product {}", product_id),
            price_cents: 100,
            quantity: qty,
            line_total_cents: 100 * qty,
            cover_image: format!("images/{}.jpg", product_id),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        let sale = sample_sale("cashier-1", 300);
        let items = vec![
            sample_item(&sale.id, "a", 1),
            sample_item(&sale.id, "b", 2),
        ];

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sale, &items).await.unwrap();
        tx.commit().await.unwrap();

        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_cents, 300);
        assert_eq!(loaded.payment_method, PaymentMethod::Card);

        let loaded_items = repo.get_items(&sale.id).await.unwrap();
        assert_eq!(loaded_items.len(), 2);
        assert_eq!(loaded_items[0].product_id, "a");
        assert_eq!(loaded_items[1].product_id, "b");
    }

    #[tokio::test]
    async fn test_list_filters_by_cashier() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        for (cashier, total) in [("c1", 100), ("c2", 200), ("c1", 300)] {
            let sale = sample_sale(cashier, total);
            let mut tx = db.begin().await.unwrap();
            repo.insert(&mut tx, &sale, &[]).await.unwrap();
            tx.commit().await.unwrap();
        }

        assert_eq!(repo.list(None).await.unwrap().len(), 3);

        let c1_sales = repo.list(Some("c1")).await.unwrap();
        assert_eq!(c1_sales.len(), 2);
        assert!(c1_sales.iter().all(|s| s.cashier_id == "c1"));

        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
