//! # Stock Inbound Repository
//!
//! Read access to the append-only history of received batches. Records are
//! written only by the inbound coordinator, in the same atomic unit as the
//! stock and cost update they explain.

use sqlx::SqlitePool;

use crate::error::DbResult;
use storefront_core::StockInboundRecord;

/// Repository for stock inbound history.
#[derive(Debug, Clone)]
pub struct StockInboundRepository {
    pool: SqlitePool,
}

impl StockInboundRepository {
    /// Creates a new StockInboundRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockInboundRepository { pool }
    }

    /// Newest first, optionally for one product.
    pub async fn list(&self, product_id: Option<&str>, limit: u32) -> DbResult<Vec<StockInboundRecord>> {
        let records = match product_id {
            Some(product_id) => {
                sqlx::query_as::<_, StockInboundRecord>(
                    r#"
                    SELECT * FROM stock_inbound
                    WHERE product_id = ?1
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?2
                    "#,
                )
                .bind(product_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StockInboundRecord>(
                    "SELECT * FROM stock_inbound ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    /// Counts records for a product.
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_inbound WHERE product_id = ?1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
