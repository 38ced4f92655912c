//! # Ledger Store Atomic Unit
//!
//! [`LedgerTx`] is one SQLite transaction plus the audit entries to emit
//! once it commits. Every coordinator does all of its writes through one.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN (deferred)                                                       │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  UPDATE products SET updated_at = updated_at WHERE id = ? RETURNING *   │
//! │    │   first statement is a write: this connection now holds the       │
//! │    │   database write lock; a racing writer waits on busy_timeout      │
//! │    ▼                                                                    │
//! │  read-check-write on rows nobody else can change                       │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT ──► emit queued audit entries        (drop = ROLLBACK)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock decrements also carry their own guard
//! (`WHERE stock_quantity + ? >= 0`) and the table has
//! `CHECK (stock_quantity >= 0)`.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, trace};

use storefront_core::audit::NewAuditEntry;
use storefront_core::stock::StockPlan;
use storefront_core::{Money, Order, OrderItem, OrderStatus, Product, StockInboundRecord, UnitCost};

use crate::audit::AuditEmitter;
use crate::error::{DbError, DbResult};

/// An open atomic unit of work.
///
/// Dropping it without [`commit`](LedgerTx::commit) rolls everything back
/// and discards the queued audit entries.
pub struct LedgerTx {
    tx: Transaction<'static, Sqlite>,
    after_commit: Vec<NewAuditEntry>,
}

impl LedgerTx {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        trace!("Atomic unit opened");
        Ok(LedgerTx {
            tx,
            after_commit: Vec::new(),
        })
    }

    /// Commits, then hands every queued audit entry to the emitter.
    ///
    /// Audit entries are only emitted for a committed unit and never affect
    /// the outcome of the commit.
    pub async fn commit(self, audit: &AuditEmitter) -> DbResult<()> {
        let LedgerTx { tx, after_commit } = self;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!(audit_entries = after_commit.len(), "Atomic unit committed");

        for entry in after_commit {
            audit.record(entry);
        }
        Ok(())
    }

    /// Rolls back explicitly. Equivalent to dropping, but surfaces errors.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        trace!("Atomic unit rolled back");
        Ok(())
    }

    /// Queues an audit entry to emit after a successful commit.
    pub fn after_commit(&mut self, entry: NewAuditEntry) {
        self.after_commit.push(entry);
    }

    /// Number of audit entries queued so far.
    pub fn pending_audit_entries(&self) -> usize {
        self.after_commit.len()
    }

    // =========================================================================
    // Locking Reads
    // =========================================================================

    /// Reads a product and takes the write lock on it.
    ///
    /// Returns `None` if the product does not exist.
    pub async fn get_product_for_update(&mut self, id: &str) -> DbResult<Option<Product>> {
        trace!(product_id = %id, "Locking product");
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET updated_at = updated_at WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(product)
    }

    /// Reads an order and takes the write lock on it.
    pub async fn get_order_for_update(&mut self, id: &str) -> DbResult<Option<Order>> {
        trace!(order_id = %id, "Locking order");
        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET updated_at = updated_at WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(order)
    }

    /// Items of an order, in insertion order.
    pub async fn get_order_items(&mut self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ?1 ORDER BY rowid",
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(items)
    }

    /// The order that already carries `key`, if any.
    pub async fn find_order_by_idempotency_key(&mut self, key: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE idempotency_key = ?1")
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(order)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Overwrites stock and average cost. Only the inbound path calls this.
    pub async fn update_product_stock_and_cost(
        &mut self,
        id: &str,
        stock_quantity: i64,
        cost_price: UnitCost,
    ) -> DbResult<()> {
        debug!(product_id = %id, stock_quantity, cost_price = %cost_price, "Updating stock and cost");
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = ?1, cost_price = ?2, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(stock_quantity)
        .bind(cost_price.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Applies every delta of the plan; all rows or none.
    ///
    /// A decrement that would drive stock below zero matches no row and
    /// fails the whole unit.
    pub async fn apply_stock_deltas(&mut self, plan: &StockPlan) -> DbResult<()> {
        let now = Utc::now();
        for delta in plan.deltas() {
            debug!(product_id = %delta.product_id, delta = delta.delta, "Applying stock delta");
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity + ?1, updated_at = ?2
                WHERE id = ?3 AND stock_quantity + ?1 >= 0
                "#,
            )
            .bind(delta.delta)
            .bind(now)
            .bind(&delta.product_id)
            .execute(&mut *self.tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::CheckViolation {
                    message: format!(
                        "stock of product {} cannot change by {}",
                        delta.product_id, delta.delta
                    ),
                });
            }
        }
        Ok(())
    }

    pub async fn insert_order(&mut self, order: &Order) -> DbResult<()> {
        debug!(order_id = %order.id, total = %order.total_amount, "Inserting order");
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_name, customer_phone, customer_address, notes,
                total_amount, status, idempotency_key, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.customer_address)
        .bind(&order.notes)
        .bind(order.total_amount)
        .bind(order.status)
        .bind(&order.idempotency_key)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    pub async fn insert_order_items(&mut self, items: &[OrderItem]) -> DbResult<()> {
        for item in items {
            trace!(order_id = %item.order_id, product_id = %item.product_id, "Inserting order item");
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, quantity, unit_price, subtotal, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .bind(item.created_at)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    pub async fn insert_stock_inbound_record(&mut self, record: &StockInboundRecord) -> DbResult<()> {
        debug!(product_id = %record.product_id, quantity = record.quantity_added, "Inserting stock inbound record");
        sqlx::query(
            r#"
            INSERT INTO stock_inbound (
                id, product_id, quantity_added, cost_price_at_time, supplier, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_id)
        .bind(record.quantity_added)
        .bind(record.cost_price_at_time)
        .bind(&record.supplier)
        .bind(&record.notes)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    pub async fn update_order_status(&mut self, id: &str, status: OrderStatus) -> DbResult<()> {
        debug!(order_id = %id, status = %status, "Updating order status");
        let result = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }
        Ok(())
    }

    /// Adds units without touching the average cost.
    ///
    /// ## Returns
    /// The product after the change.
    pub async fn add_product_stock(&mut self, id: &str, quantity: i64) -> DbResult<Product> {
        debug!(product_id = %id, quantity, "Adding stock");
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING *
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Turns a product on or off for new orders.
    pub async fn update_product_active(&mut self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Overwrites a product's selling price.
    pub async fn update_product_price(&mut self, id: &str, price: Money) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET price = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(price)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
