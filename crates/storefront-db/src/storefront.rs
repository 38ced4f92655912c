//! # Storefront
//!
//! The one handle callers hold. Owns the database, the audit emitter and
//! the business settings, and exposes every ledger operation plus the
//! catalog edits the back office needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront (Clone, cheap)                                              │
//! │     │                                                                   │
//! │     ├── place_order / transition_order_status / record_stock_inbound   │
//! │     │        └──► coordinators (one atomic unit each)                   │
//! │     │                                                                   │
//! │     ├── create_product / update_product_price / restock_product        │
//! │     │   set_product_active                                              │
//! │     │        └──► single insert or short atomic unit + audit entry      │
//! │     │                                                                   │
//! │     └── reads ──► repositories                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{info, instrument};

use storefront_core::audit::{AuditLogEntry, NewAuditEntry};
use storefront_core::stock::StockPlan;
use storefront_core::validation::{
    validate_inbound_quantity, validate_new_product, validate_price, validate_uuid,
};
use storefront_core::{
    CartLine, CoreError, Money, NewProduct, Order, OrderDetails, OrderStatus, Product,
};

use crate::audit::AuditEmitter;
use crate::config::StorefrontConfig;
use crate::coordinator::inbound::{self, InboundHistory, StockInboundOutcome, StockInboundRequest};
use crate::coordinator::placement::{self, OrderReceipt, PlaceOrderRequest};
use crate::coordinator::status::{self, TransitionOutcome};
use crate::coordinator::LedgerSettings;
use crate::error::LedgerResult;
use crate::pool::Database;

/// Entry point to the ledger.
#[derive(Debug, Clone)]
pub struct Storefront {
    db: Database,
    audit: AuditEmitter,
    settings: LedgerSettings,
}

impl Storefront {
    /// Opens the database, runs migrations and starts the audit writer.
    ///
    /// Must be called from inside a tokio runtime.
    pub async fn open(config: &StorefrontConfig) -> LedgerResult<Self> {
        let db = Database::new(config.db_config()).await?;
        let audit = AuditEmitter::spawn(db.audit_logs(), config.audit_buffer);
        info!(
            path = %config.database_path.display(),
            commit_point = %config.stock_commit_point,
            "Storefront ledger opened"
        );
        Ok(Storefront::new(db, audit, LedgerSettings::from(config)))
    }

    pub fn new(db: Database, audit: AuditEmitter, settings: LedgerSettings) -> Self {
        Storefront { db, audit, settings }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn audit(&self) -> &AuditEmitter {
        &self.audit
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    pub async fn place_order(&self, request: &PlaceOrderRequest) -> LedgerResult<OrderReceipt> {
        placement::place_order(&self.db, &self.audit, &self.settings, request).await
    }

    pub async fn check_stock_availability(&self, items: &[CartLine]) -> LedgerResult<StockPlan> {
        placement::check_stock_availability(&self.db, items).await
    }

    pub async fn transition_order_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> LedgerResult<TransitionOutcome> {
        status::transition_order_status(&self.db, &self.audit, &self.settings, order_id, from, to)
            .await
    }

    pub async fn record_stock_inbound(
        &self,
        request: &StockInboundRequest,
    ) -> LedgerResult<StockInboundOutcome> {
        inbound::record_stock_inbound(&self.db, &self.audit, &self.settings, request).await
    }

    pub async fn stock_inbound_history(
        &self,
        product_id: Option<&str>,
        limit: u32,
    ) -> LedgerResult<InboundHistory> {
        inbound::stock_inbound_history(&self.db, product_id, limit).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Adds a product to the catalog.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> LedgerResult<Product> {
        let product = validate_new_product(product)?;
        let created = self.db.products().insert(&product).await?;

        self.audit.record(
            NewAuditEntry::product_created(
                &created.id,
                &created.name,
                created.price,
                created.stock_quantity,
            )
            .with_actor(self.settings.audit_actor.clone()),
        );
        Ok(created)
    }

    /// Changes the selling price. Existing orders keep their snapshot.
    #[instrument(skip(self))]
    pub async fn update_product_price(&self, product_id: &str, price: Money) -> LedgerResult<Product> {
        validate_uuid("product id", product_id)?;
        validate_price(price)?;

        let mut tx = self.db.begin_atomic_unit().await?;
        let product = tx
            .get_product_for_update(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if product.price == price {
            tx.rollback().await?;
            return Ok(product);
        }

        tx.update_product_price(product_id, price).await?;
        tx.after_commit(
            NewAuditEntry::product_price_updated(product_id, &product.name, product.price, price)
                .with_actor(self.settings.audit_actor.clone()),
        );
        tx.commit(&self.audit).await?;

        Ok(Product { price, ..product })
    }

    /// Adds units without a cost; the average cost is unchanged.
    ///
    /// Received batches with a cost go through
    /// [`record_stock_inbound`](Self::record_stock_inbound) instead.
    #[instrument(skip(self))]
    pub async fn restock_product(&self, product_id: &str, quantity: i64) -> LedgerResult<Product> {
        validate_uuid("product id", product_id)?;
        validate_inbound_quantity(quantity)?;

        let mut tx = self.db.begin_atomic_unit().await?;
        let before = tx
            .get_product_for_update(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        before
            .stock_quantity
            .checked_add(quantity)
            .ok_or(CoreError::AmountOverflow("stock quantity"))?;

        let after = tx.add_product_stock(product_id, quantity).await?;
        tx.after_commit(
            NewAuditEntry::product_stock_updated(
                &after.id,
                &after.name,
                before.stock_quantity,
                after.stock_quantity,
            )
            .with_actor(self.settings.audit_actor.clone()),
        );
        tx.commit(&self.audit).await?;

        Ok(after)
    }

    /// Hides or shows a product. Hidden products cannot be ordered but keep
    /// their stock and history.
    ///
    /// Setting the flag it already has is a no-op and writes no audit entry.
    #[instrument(skip(self))]
    pub async fn set_product_active(&self, product_id: &str, is_active: bool) -> LedgerResult<Product> {
        validate_uuid("product id", product_id)?;

        let mut tx = self.db.begin_atomic_unit().await?;
        let product = tx
            .get_product_for_update(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if product.is_active == is_active {
            tx.rollback().await?;
            return Ok(product);
        }

        tx.update_product_active(product_id, is_active).await?;
        tx.after_commit(
            NewAuditEntry::product_status_changed(
                product_id,
                &product.name,
                product.is_active,
                is_active,
            )
            .with_actor(self.settings.audit_actor.clone()),
        );
        tx.commit(&self.audit).await?;

        info!(product = %product.name, is_active, "Product visibility changed");
        Ok(Product { is_active, ..product })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_order_details(&self, order_id: &str) -> LedgerResult<OrderDetails> {
        validate_uuid("order id", order_id)?;
        self.db
            .orders()
            .get_details(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>, limit: u32) -> LedgerResult<Vec<Order>> {
        Ok(self.db.orders().list_by_status(status, limit).await?)
    }

    pub async fn list_active_products(&self, limit: u32) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().list_active(limit).await?)
    }

    pub async fn get_product(&self, product_id: &str) -> LedgerResult<Product> {
        validate_uuid("product id", product_id)?;
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    /// Latest audit entries, newest first. Call
    /// [`AuditEmitter::flush`] first to include entries still queued.
    pub async fn recent_audit_entries(&self, limit: u32) -> LedgerResult<Vec<AuditLogEntry>> {
        Ok(self.db.audit_logs().list_recent(limit).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::DbConfig;
    use storefront_core::UnitCost;

    async fn storefront() -> Storefront {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let audit = AuditEmitter::spawn(db.audit_logs(), 32);
        Storefront::new(db, audit, LedgerSettings::default())
    }

    fn espresso() -> NewProduct {
        NewProduct {
            name: "  Espresso Beans 1kg ".to_string(),
            description: Some(" ".to_string()),
            category: String::new(),
            price: Money::from_units(420_000),
            cost_price: UnitCost::from_units(300_000),
            stock_quantity: 4,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_product_normalizes_and_audits() {
        let sf = storefront().await;
        let product = sf.create_product(&espresso()).await.unwrap();

        assert_eq!(product.name, "Espresso Beans 1kg");
        assert_eq!(product.category, "general");
        assert!(product.description.is_none());

        sf.audit().flush().await;
        let entries = sf.recent_audit_entries(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "product.created");
        assert_eq!(entries[0].actor, "Admin");
    }

    #[tokio::test]
    async fn test_update_price_records_old_and_new() {
        let sf = storefront().await;
        let product = sf.create_product(&espresso()).await.unwrap();

        let updated = sf
            .update_product_price(&product.id, Money::from_units(450_000))
            .await
            .unwrap();
        assert_eq!(updated.price, Money::from_units(450_000));
        assert_eq!(sf.get_product(&product.id).await.unwrap().price, Money::from_units(450_000));

        sf.audit().flush().await;
        let entries = sf
            .database()
            .audit_logs()
            .list_by_event_type("product.price_updated")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_values.as_ref().unwrap()["price"], 420_000);

        let err = sf
            .update_product_price(&product.id, Money::from_units(-1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_restock_keeps_cost() {
        let sf = storefront().await;
        let product = sf.create_product(&espresso()).await.unwrap();

        let restocked = sf.restock_product(&product.id, 6).await.unwrap();
        assert_eq!(restocked.stock_quantity, 10);
        assert_eq!(restocked.cost_price, UnitCost::from_units(300_000));

        sf.audit().flush().await;
        let entries = sf
            .database()
            .audit_logs()
            .list_by_event_type("product.stock_updated")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_values.as_ref().unwrap()["stock_quantity"], 4);
        assert_eq!(entries[0].new_values.as_ref().unwrap()["stock_quantity"], 10);

        let err = sf.restock_product(&product.id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let missing = uuid::Uuid::new_v4().to_string();
        let err = sf.restock_product(&missing, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_set_active_hides_from_listing() {
        let sf = storefront().await;
        let product = sf.create_product(&espresso()).await.unwrap();
        assert_eq!(sf.list_active_products(10).await.unwrap().len(), 1);

        let hidden = sf.set_product_active(&product.id, false).await.unwrap();
        assert!(!hidden.is_active);
        assert!(sf.list_active_products(10).await.unwrap().is_empty());

        // Already hidden: nothing to record.
        sf.set_product_active(&product.id, false).await.unwrap();

        sf.audit().flush().await;
        let entries = sf
            .database()
            .audit_logs()
            .list_by_event_type("product.status_changed")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "deactivate");

        let missing = uuid::Uuid::new_v4().to_string();
        let err = sf.set_product_active(&missing, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let sf = storefront().await;
        let missing = uuid::Uuid::new_v4().to_string();
        let err = sf.get_order_details(&missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
