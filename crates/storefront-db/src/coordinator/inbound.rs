//! # Stock Inbound
//!
//! Receiving a batch from a supplier: one append-only history row, higher
//! stock and a new weighted-average cost, all in one atomic unit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock 10 @ 100  +  batch 10 @ 200                                      │
//! │                                                                         │
//! │  new cost = (10 × 100 + 10 × 200) / 20 = 150                            │
//! │  new stock = 20                                                         │
//! │                                                                         │
//! │  stock 1 @ 1  +  batch 1 @ 2  ─►  2 @ 1.5                               │
//! │                                                                         │
//! │  stock 0 @ anything  +  batch 5 @ 80  ─►  5 @ 80                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use storefront_core::audit::NewAuditEntry;
use storefront_core::cost::CostBasis;
use storefront_core::validation::{
    optional_text, validate_cost, validate_inbound_quantity, validate_uuid,
};
use storefront_core::{CoreError, InboundStats, Money, StockInboundRecord, UnitCost};

use crate::audit::AuditEmitter;
use crate::coordinator::LedgerSettings;
use crate::error::LedgerResult;
use crate::pool::Database;

const MAX_SUPPLIER_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 1000;

/// A batch received from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInboundRequest {
    pub product_id: String,
    pub quantity_added: i64,
    /// Unit cost of this batch.
    pub cost_price_at_time: Money,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInboundOutcome {
    pub record: StockInboundRecord,
    pub product_name: String,
    pub old_stock: i64,
    pub new_stock: i64,
    pub old_cost: UnitCost,
    pub new_cost: UnitCost,
}

/// Inbound history plus totals over the returned rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundHistory {
    pub records: Vec<StockInboundRecord>,
    pub stats: InboundStats,
}

/// Records a received batch and re-averages the product's cost.
///
/// Inactive products can still be restocked.
///
/// ## Errors
/// - `Validation` for a non-positive quantity, negative cost or oversize text
/// - `ProductNotFound`
/// - `AmountOverflow` if the new stock level or average does not fit
#[instrument(skip(db, audit, settings, request), fields(product_id = %request.product_id, quantity = request.quantity_added))]
pub async fn record_stock_inbound(
    db: &Database,
    audit: &AuditEmitter,
    settings: &LedgerSettings,
    request: &StockInboundRequest,
) -> LedgerResult<StockInboundOutcome> {
    validate_uuid("product id", &request.product_id)?;
    validate_inbound_quantity(request.quantity_added)?;
    validate_cost(request.cost_price_at_time)?;
    let supplier = optional_text("supplier", request.supplier.as_deref(), MAX_SUPPLIER_LEN)?;
    let notes = optional_text("notes", request.notes.as_deref(), MAX_NOTES_LEN)?;

    let mut tx = db.begin_atomic_unit().await?;
    let product = tx
        .get_product_for_update(&request.product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

    let before = CostBasis::new(product.stock_quantity, product.cost_price);
    let after = before.receive(request.quantity_added, request.cost_price_at_time)?;

    let record = StockInboundRecord {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        quantity_added: request.quantity_added,
        cost_price_at_time: request.cost_price_at_time,
        supplier,
        notes,
        created_at: Utc::now(),
    };

    tx.insert_stock_inbound_record(&record).await?;
    tx.update_product_stock_and_cost(&product.id, after.quantity, after.avg_cost)
        .await?;

    tx.after_commit(
        NewAuditEntry::stock_inbound(&record, &product.name, before, after)
            .with_actor(settings.audit_actor.clone()),
    );
    tx.commit(audit).await?;

    info!(
        product = %product.name,
        old_stock = before.quantity,
        new_stock = after.quantity,
        new_cost = %after.avg_cost,
        "Stock received"
    );

    Ok(StockInboundOutcome {
        record,
        product_name: product.name,
        old_stock: before.quantity,
        new_stock: after.quantity,
        old_cost: before.avg_cost,
        new_cost: after.avg_cost,
    })
}

/// Received batches, newest first, optionally for one product.
pub async fn stock_inbound_history(
    db: &Database,
    product_id: Option<&str>,
    limit: u32,
) -> LedgerResult<InboundHistory> {
    if let Some(id) = product_id {
        validate_uuid("product id", id)?;
    }
    let records = db.stock_inbound().list(product_id, limit).await?;
    let stats = InboundStats::from_records(&records);
    Ok(InboundHistory { records, stats })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::DbConfig;
    use storefront_core::NewProduct;

    fn m(v: i64) -> Money {
        Money::from_units(v)
    }

    fn c(v: i64) -> UnitCost {
        UnitCost::from_units(v)
    }

    async fn setup(stock: i64, cost: i64) -> (Database, AuditEmitter, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let audit = AuditEmitter::spawn(db.audit_logs(), 16);
        let product = db
            .products()
            .insert(&NewProduct {
                name: "Arabica 250g".to_string(),
                description: None,
                category: "coffee".to_string(),
                price: m(150_000),
                cost_price: c(cost),
                stock_quantity: stock,
                is_active: true,
            })
            .await
            .unwrap();
        (db, audit, product.id)
    }

    fn batch(product_id: &str, qty: i64, cost: i64) -> StockInboundRequest {
        StockInboundRequest {
            product_id: product_id.to_string(),
            quantity_added: qty,
            cost_price_at_time: m(cost),
            supplier: Some("  Dalat Farms ".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_inbound_averages_cost() {
        let (db, audit, id) = setup(10, 100).await;
        let settings = LedgerSettings::default();

        let outcome = record_stock_inbound(&db, &audit, &settings, &batch(&id, 10, 200))
            .await
            .unwrap();

        assert_eq!(outcome.old_stock, 10);
        assert_eq!(outcome.new_stock, 20);
        assert_eq!(outcome.old_cost, c(100));
        assert_eq!(outcome.new_cost, c(150));
        assert_eq!(outcome.record.supplier.as_deref(), Some("Dalat Farms"));

        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 20);
        assert_eq!(product.cost_price, c(150));
    }

    #[tokio::test]
    async fn test_inbound_keeps_fractional_average() {
        let (db, audit, id) = setup(1, 1).await;
        let settings = LedgerSettings::default();

        let outcome = record_stock_inbound(&db, &audit, &settings, &batch(&id, 1, 2))
            .await
            .unwrap();
        assert_eq!(outcome.new_cost.to_string(), "1.5");

        // Read back from storage, then blend again: (2 * 1.5 + 2 * 3) / 4
        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.cost_price, "1.5".parse::<UnitCost>().unwrap());

        let outcome = record_stock_inbound(&db, &audit, &settings, &batch(&id, 2, 3))
            .await
            .unwrap();
        assert_eq!(outcome.new_cost, "2.25".parse::<UnitCost>().unwrap());
    }

    #[tokio::test]
    async fn test_inbound_into_empty_stock_takes_batch_cost() {
        let (db, audit, id) = setup(0, 999).await;
        let settings = LedgerSettings::default();

        let outcome = record_stock_inbound(&db, &audit, &settings, &batch(&id, 5, 80))
            .await
            .unwrap();

        assert_eq!(outcome.new_stock, 5);
        assert_eq!(outcome.new_cost, c(80));
    }

    #[tokio::test]
    async fn test_inbound_rejects_bad_input_without_writing() {
        let (db, audit, id) = setup(3, 100).await;
        let settings = LedgerSettings::default();

        let err = record_stock_inbound(&db, &audit, &settings, &batch(&id, 0, 100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = record_stock_inbound(&db, &audit, &settings, &batch(&id, 1, -5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let missing = Uuid::new_v4().to_string();
        let err = record_stock_inbound(&db, &audit, &settings, &batch(&missing, 1, 100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(db.stock_inbound().count_for_product(&id).await.unwrap(), 0);
        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_history_with_stats() {
        let (db, audit, id) = setup(0, 0).await;
        let settings = LedgerSettings::default();

        record_stock_inbound(&db, &audit, &settings, &batch(&id, 4, 100)).await.unwrap();
        record_stock_inbound(&db, &audit, &settings, &batch(&id, 6, 50)).await.unwrap();

        let history = stock_inbound_history(&db, Some(&id), 50).await.unwrap();
        assert_eq!(history.records.len(), 2);
        assert_eq!(history.stats.total_records, 2);
        assert_eq!(history.stats.total_quantity, 10);
        assert_eq!(history.stats.total_value, m(700));

        audit.flush().await;
        let entries = db.audit_logs().list_by_event_type("stock.inbound").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].actor, "Admin");
    }
}
