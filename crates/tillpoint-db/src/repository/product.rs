//! # Product Repository
//!
//! Database operations for products, including the stock ledger.
//!
//! ## Stock Ledger Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Conditional Stock Decrement                            │
//! │                                                                         │
//! │  ❌ WRONG: read-modify-write in application code                        │
//! │     let p = get(id);                                                    │
//! │     if p.quantity >= n { update(quantity = p.quantity - n) }            │
//! │     (two concurrent checkouts can both pass the check)                  │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement                                  │
//! │     UPDATE products SET quantity = quantity - n                         │
//! │     WHERE id = ? AND quantity >= n                                      │
//! │                                                                         │
//! │  rows_affected = 1 → decrement applied                                  │
//! │  rows_affected = 0 → insufficient stock (or product gone)               │
//! │                                                                         │
//! │  Two checkouts contending for the last unit resolve to exactly one     │
//! │  winner; stock can never go negative (backed up by the CHECK           │
//! │  constraint on the column).                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger decrements one product at a time; making a whole cart's worth
//! of decrements atomic is the checkout engine's transaction boundary, which
//! is why the decrement takes the caller's connection.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tillpoint_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_id("uuid-here").await?;
/// let listing = repo.list(50).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str =
    "id, name, sku, quantity, price_cents, category, cover_image, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - SKU or name already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, quantity, price_cents, category, cover_image,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.quantity)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(&product.cover_image)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product (admin edit path).
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                quantity = ?4,
                price_cents = ?5,
                category = ?6,
                cover_image = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.quantity)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(&product.cover_image)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Cart and sale line items keep their frozen snapshots and weak
    /// product references, so history survives the delete.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Atomically decrements stock, but only if enough is on hand.
    ///
    /// Runs on the caller's connection so a checkout can group several
    /// decrements into one transaction.
    ///
    /// ## Returns
    /// * `Ok(true)` - stock was decremented
    /// * `Ok(false)` - not enough stock (or no such product); nothing changed
    pub async fn decrement_stock(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        amount: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, amount = %amount, "Decrementing stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Reads the current stock level on the caller's connection.
    ///
    /// Used by the checkout engine to report how much was actually
    /// available when a decrement is refused.
    pub async fn stock_level(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<i64>> {
        let level: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(level)
    }

    /// Adds stock back (admin restock path).
    pub async fn restock(&self, id: &str, amount: i64) -> DbResult<()> {
        debug!(id = %id, amount = %amount, "Restocking");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_product(name: &str, sku: &str, stock: i64, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            name: name.to_string(),
            sku: sku.to_string(),
            quantity: stock,
            price_cents,
            category: "beverages".to_string(),
            cover_image: format!("images/{}.jpg", sku),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("Coca-Cola 330ml", "COKE-330", 24, 150);
        repo.insert(&product).await.unwrap();

        let loaded = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.sku, "COKE-330");
        assert_eq!(loaded.quantity, 24);
        assert_eq!(loaded.price_cents, 150);

        let by_sku = repo.get_by_sku("COKE-330").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("Pepsi", "PEP-1", 5, 120))
            .await
            .unwrap();
        let err = repo
            .insert(&sample_product("Pepsi Max", "PEP-1", 5, 120))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("Fanta", "FAN-1", 3, 130);
        repo.insert(&product).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        assert!(repo.decrement_stock(&mut tx, &product.id, 2).await.unwrap());
        // Only 1 left; asking for 2 is refused without changing anything
        assert!(!repo.decrement_stock(&mut tx, &product.id, 2).await.unwrap());
        assert_eq!(
            repo.stock_level(&mut tx, &product.id).await.unwrap(),
            Some(1)
        );
        tx.commit().await.unwrap();

        let loaded = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity, 1);
    }

    #[tokio::test]
    async fn test_rollback_restores_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("Sprite", "SPR-1", 10, 140);
        repo.insert(&product).await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            assert!(repo.decrement_stock(&mut tx, &product.id, 4).await.unwrap());
            // Dropped without commit → rollback
        }

        let loaded = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity, 10);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("Water", "WAT-1", 1, 90);
        repo.insert(&product).await.unwrap();
        repo.delete(&product.id).await.unwrap();

        assert!(repo.get_by_id(&product.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&product.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
