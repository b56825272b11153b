//! # Cart Repository
//!
//! Persistence for the cart aggregate.
//!
//! ## Aggregate Persistence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Persistence Model                               │
//! │                                                                         │
//! │  carts (header)                 cart_items (lines)                     │
//! │  ┌──────────────────┐           ┌──────────────────────────┐           │
//! │  │ id               │◄──────────│ cart_id (FK, CASCADE)    │           │
//! │  │ cashier_id       │           │ product_id (weak ref)    │           │
//! │  │ status           │           │ name / price snapshots   │           │
//! │  │ totals (derived) │           │ quantity, line_total     │           │
//! │  └──────────────────┘           │ position (ring-up order) │           │
//! │                                 └──────────────────────────┘           │
//! │                                                                         │
//! │  save() rewrites the lines wholesale inside one transaction: carts     │
//! │  are small (a till, not a warehouse order), and replacing the lines    │
//! │  keeps the stored state an exact mirror of the in-memory aggregate.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Open Cart Per Cashier
//! The `idx_carts_open_per_cashier` partial unique index makes the
//! per-cashier singleton a storage guarantee. `insert` surfaces the
//! violation as `DbError::UniqueViolation` so the service can fall back to
//! the cart that won the race.

use chrono::Utc;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tillpoint_core::{Cart, CartItem, CartStatus};
use uuid::Uuid;

/// Header row for a cart, before its items are attached.
#[derive(Debug, FromRow)]
struct CartHeaderRow {
    id: String,
    cashier_id: String,
    status: CartStatus,
    total_quantity: i64,
    subtotal_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl CartHeaderRow {
    fn into_cart(self, items: Vec<CartItem>) -> Cart {
        Cart {
            id: self.id,
            cashier_id: self.cashier_id,
            status: self.status,
            items,
            total_quantity: self.total_quantity,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const CART_COLUMNS: &str = "id, cashier_id, status, total_quantity, subtotal_cents, tax_cents, \
                            total_cents, created_at, updated_at";

const ITEM_COLUMNS: &str = "product_id, name, price_cents, cover_image, quantity, line_total_cents";

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Finds a cashier's open cart, items included.
    pub async fn find_open_by_cashier(&self, cashier_id: &str) -> DbResult<Option<Cart>> {
        let header = sqlx::query_as::<_, CartHeaderRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE cashier_id = ?1 AND status = 'open'"
        ))
        .bind(cashier_id)
        .fetch_optional(&self.pool)
        .await?;

        match header {
            Some(header) => {
                let items = self.load_items(&header.id).await?;
                Ok(Some(header.into_cart(items)))
            }
            None => Ok(None),
        }
    }

    /// Gets a cart by ID, items included.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Cart>> {
        let header = sqlx::query_as::<_, CartHeaderRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match header {
            Some(header) => {
                let items = self.load_items(&header.id).await?;
                Ok(Some(header.into_cart(items)))
            }
            None => Ok(None),
        }
    }

    async fn load_items(&self, cart_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = ?1 ORDER BY position"
        ))
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new cart header (normally empty, created lazily on the
    /// first add-to-cart).
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the cashier already has an open cart
    pub async fn insert(&self, cart: &Cart) -> DbResult<()> {
        debug!(cart_id = %cart.id, cashier_id = %cart.cashier_id, "Creating cart");

        sqlx::query(
            r#"
            INSERT INTO carts (
                id, cashier_id, status, total_quantity,
                subtotal_cents, tax_cents, total_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.cashier_id)
        .bind(cart.status)
        .bind(cart.total_quantity)
        .bind(cart.subtotal_cents)
        .bind(cart.tax_cents)
        .bind(cart.total_cents)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        if !cart.items.is_empty() {
            self.save(cart).await?;
        }

        Ok(())
    }

    /// Persists the aggregate: header totals plus a wholesale rewrite of
    /// the line items, in one transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - cart doesn't exist or is no longer open
    pub async fn save(&self, cart: &Cart) -> DbResult<()> {
        debug!(cart_id = %cart.id, items = cart.items.len(), "Saving cart");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE carts SET
                total_quantity = ?2,
                subtotal_cents = ?3,
                tax_cents = ?4,
                total_cents = ?5,
                updated_at = ?6
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(&cart.id)
        .bind(cart.total_quantity)
        .bind(cart.subtotal_cents)
        .bind(cart.tax_cents)
        .bind(cart.total_cents)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", &cart.id));
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (
                    id, cart_id, product_id, name, price_cents, cover_image,
                    quantity, line_total_cents, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&cart.id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(&item.cover_image)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Conditionally transitions a cart from `open` to `completed`.
    ///
    /// This is the at-most-once checkout gate: executed as a single
    /// statement on the checkout transaction, exactly one of any number of
    /// concurrent attempts observes `rows_affected = 1`.
    ///
    /// ## Returns
    /// * `Ok(true)` - this caller claimed the cart
    /// * `Ok(false)` - the cart was not open (already claimed or canceled)
    pub async fn claim_for_checkout(
        &self,
        conn: &mut SqliteConnection,
        cart_id: &str,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE carts SET status = 'completed', updated_at = ?2
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(cart_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes a cart row (items cascade) on the caller's connection.
    ///
    /// The open-cart table only ever holds in-progress carts; once a sale
    /// is materialized the cart row is dropped in the same transaction.
    pub async fn delete(&self, conn: &mut SqliteConnection, cart_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, "Deleting cart");

        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Cancels an open cart (explicit abandonment, not checkout).
    ///
    /// ## Errors
    /// * `DbError::NotFound` - cart doesn't exist or is not open
    pub async fn cancel(&self, cart_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, "Canceling cart");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE carts SET status = 'canceled', updated_at = ?2
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(cart_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", cart_id));
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
    use crate::pool::{Database, DbConfig};
    use tillpoint_core::Product;

    fn sample_product(id: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            sku: format!("SKU-{}", id),
            quantity: 100,
            price_cents,
            category: "test".to_string(),
            cover_image: format!("images/{}.jpg", id),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_save_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let mut cart = Cart::new("cashier-1");
        repo.insert(&cart).await.unwrap();

        cart.add_item(&sample_product("a", 150), 2).unwrap();
        cart.add_item(&sample_product("b", 999), 1).unwrap();
        repo.save(&cart).await.unwrap();

        let loaded = repo.get_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 2);
        // Ring-up order preserved
        assert_eq!(loaded.items[0].product_id, "a");
        assert_eq!(loaded.items[1].product_id, "b");
        assert_eq!(loaded.subtotal_cents, cart.subtotal_cents);
        assert_eq!(loaded.total_cents, cart.total_cents);
        assert_eq!(loaded.status, CartStatus::Open);
    }

    #[tokio::test]
    async fn test_one_open_cart_per_cashier() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        repo.insert(&Cart::new("cashier-1")).await.unwrap();

        let err = repo.insert(&Cart::new("cashier-1")).await.unwrap_err();
        assert!(err.is_unique_violation());

        // A different cashier is unaffected
        repo.insert(&Cart::new("cashier-2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let cart = Cart::new("cashier-1");
        repo.insert(&cart).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        assert!(repo.claim_for_checkout(&mut tx, &cart.id).await.unwrap());
        // Second claim on the same cart loses
        assert!(!repo.claim_for_checkout(&mut tx, &cart.id).await.unwrap());
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_cascades_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let mut cart = Cart::new("cashier-1");
        repo.insert(&cart).await.unwrap();
        cart.add_item(&sample_product("a", 150), 1).unwrap();
        repo.save(&cart).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        repo.delete(&mut tx, &cart.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.get_by_id(&cart.id).await.unwrap().is_none());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_cancel_frees_the_slot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.carts();

        let cart = Cart::new("cashier-1");
        repo.insert(&cart).await.unwrap();
        repo.cancel(&cart.id).await.unwrap();

        // Canceling again fails (no longer open)
        assert!(matches!(
            repo.cancel(&cart.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));

        // The cashier can open a fresh cart now
        repo.insert(&Cart::new("cashier-1")).await.unwrap();
        assert!(repo
            .find_open_by_cashier("cashier-1")
            .await
            .unwrap()
            .is_some());
    }
}
