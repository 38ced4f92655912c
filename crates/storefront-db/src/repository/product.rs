//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Catalog reads for the storefront (non-locking)
//! - Insert and activation toggles for the back office
//! - Plain restock (quantity only, average cost untouched)
//!
//! Stock changes tied to orders and cost changes tied to inbound batches go
//! through [`LedgerTx`](crate::ledger::LedgerTx), never through here.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use storefront_core::{NewProduct, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_id("uuid-here").await?;
/// let catalog = repo.list_active(50).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets every product whose id is in `ids`. Missing ids are skipped.
    pub async fn get_many(&self, ids: &[&str]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM products WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = query.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Lists products that can be ordered, by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// The created product with generated ID and timestamps.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        let id = generate_product_id();
        let now = Utc::now();

        debug!(id = %id, name = %product.name, "Inserting product");

        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                id, name, description, category, price, cost_price,
                stock_quantity, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.cost_price.to_string())
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
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
    use storefront_core::{Money, UnitCost};

    fn new_product(name: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            category: "drinks".to_string(),
            price: Money::from_units(15_000),
            cost_price: UnitCost::from_units(9_000),
            stock_quantity: stock,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let created = repo.insert(&new_product("Green Tea", 5)).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.price, Money::from_units(15_000));
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_and_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let tea = repo
            .insert(&NewProduct {
                is_active: false,
                ..new_product("Tea", 1)
            })
            .await
            .unwrap();
        let rice = repo.insert(&new_product("Rice", 1)).await.unwrap();

        let active = repo.list_active(10).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, rice.id);
        assert_eq!(repo.count().await.unwrap(), 1);

        let both = repo.get_many(&[&tea.id, &rice.id, "missing"]).await.unwrap();
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn test_fractional_cost_is_stored_exactly() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let cost: UnitCost = "8999.1234".parse().unwrap();
        let tea = repo
            .insert(&NewProduct {
                cost_price: cost,
                ..new_product("Tea", 2)
            })
            .await
            .unwrap();

        assert_eq!(tea.cost_price, cost);
        assert_eq!(repo.get_by_id(&tea.id).await.unwrap().unwrap().cost_price, cost);
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let err = repo.insert(&new_product("Broken", -1)).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        let err = repo
            .insert(&NewProduct {
                cost_price: "-0.5".parse().unwrap(),
                ..new_product("Broken", 1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
