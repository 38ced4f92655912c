//! Audit entries written by ledger operations, and isolation from audit
//! failures.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{customer, order, product, stock_of, store};
use storefront_core::audit::NewAuditEntry;
use storefront_core::{Money, OrderStatus, StockCommitPoint};
use storefront_db::{
    AuditEmitter, AuditError, AuditSink, Database, DbConfig, LedgerSettings, StockInboundRequest,
    Storefront,
};

#[derive(Clone, Default)]
struct BrokenSink {
    attempts: Arc<AtomicUsize>,
}

impl AuditSink for BrokenSink {
    async fn write(&self, _entry: &NewAuditEntry) -> Result<(), AuditError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::Unavailable("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_order_lifecycle_is_audited() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    let beans = product(&sf, "Arabica 250g", 100_000, 5).await;

    let receipt = sf.place_order(&order(&[(&beans.id, 2)])).await.unwrap();
    sf.transition_order_status(&receipt.order_id, OrderStatus::Pending, OrderStatus::Processing)
        .await
        .unwrap();
    sf.transition_order_status(&receipt.order_id, OrderStatus::Processing, OrderStatus::Cancelled)
        .await
        .unwrap();
    sf.audit().flush().await;

    let logs = sf.database().audit_logs();
    let order_entries = logs.list_for_entity("order", &receipt.order_id).await.unwrap();
    let kinds: Vec<&str> = order_entries.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        kinds,
        ["order.created", "order.status_changed", "order.status_changed"]
    );

    let created = &order_entries[0];
    assert_eq!(created.actor, customer().name);
    assert_eq!(created.new_values.as_ref().unwrap()["total_amount"], 200_000);

    let cancelled = &order_entries[2];
    assert_eq!(cancelled.actor, "Admin");
    assert_eq!(cancelled.old_values.as_ref().unwrap()["status"], "processing");
    assert_eq!(cancelled.new_values.as_ref().unwrap()["status"], "cancelled");

    let restores = logs.list_for_entity("system", &receipt.order_id).await.unwrap();
    assert_eq!(restores.len(), 1);
    assert_eq!(restores[0].event_type, "system.event");
    assert_eq!(restores[0].actor, "System");
    assert_eq!(restores[0].metadata.as_ref().unwrap()["units"], 2);
}

#[tokio::test]
async fn test_rejected_operations_leave_no_audit_entries() {
    let sf = store(StockCommitPoint::OnPlacement).await;
    let beans = product(&sf, "Arabica 250g", 100_000, 1).await;
    sf.audit().flush().await;
    let before = sf.recent_audit_entries(100).await.unwrap().len();

    assert!(sf.place_order(&order(&[(&beans.id, 5)])).await.is_err());
    sf.audit().flush().await;

    assert_eq!(sf.recent_audit_entries(100).await.unwrap().len(), before);
}

#[tokio::test]
async fn test_failing_audit_store_does_not_fail_operations() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let sink = BrokenSink::default();
    let audit = AuditEmitter::spawn(sink.clone(), 8);
    let sf = Storefront::new(db, audit, LedgerSettings::default());

    let beans = product(&sf, "Arabica 250g", 100_000, 5).await;
    let receipt = sf.place_order(&order(&[(&beans.id, 2)])).await.unwrap();
    sf.transition_order_status(&receipt.order_id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .unwrap();
    sf.record_stock_inbound(&StockInboundRequest {
        product_id: beans.id.clone(),
        quantity_added: 1,
        cost_price_at_time: Money::from_units(40_000),
        supplier: None,
        notes: None,
    })
    .await
    .unwrap();
    sf.audit().flush().await;

    assert_eq!(stock_of(&sf, &beans.id).await, 6);
    assert!(sink.attempts.load(Ordering::SeqCst) >= 4);
    assert!(sf.recent_audit_entries(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_edits_are_audited_with_old_and_new_values() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let audit = AuditEmitter::spawn(db.audit_logs(), 32);
    let settings = LedgerSettings {
        audit_actor: "Thu".to_string(),
        ..LedgerSettings::default()
    };
    let sf = Storefront::new(db, audit, settings);

    let beans = product(&sf, "Arabica 250g", 100_000, 5).await;
    sf.place_order(&order(&[(&beans.id, 2)])).await.unwrap();
    sf.restock_product(&beans.id, 4).await.unwrap();
    sf.set_product_active(&beans.id, false).await.unwrap();
    sf.set_product_active(&beans.id, true).await.unwrap();
    sf.audit().flush().await;

    let logs = sf.database().audit_logs();

    let restocks = logs.list_by_event_type("product.stock_updated").await.unwrap();
    assert_eq!(restocks.len(), 1);
    assert_eq!(restocks[0].actor, "Thu");
    assert_eq!(restocks[0].old_values.as_ref().unwrap()["stock_quantity"], 3);
    assert_eq!(restocks[0].new_values.as_ref().unwrap()["stock_quantity"], 7);

    let toggles = logs.list_by_event_type("product.status_changed").await.unwrap();
    assert_eq!(toggles.len(), 2);
    for entry in &toggles {
        assert_eq!(entry.entity_type, "product");
        assert_eq!(entry.entity_id.as_deref(), Some(beans.id.as_str()));
        assert_eq!(entry.actor, "Thu");
    }
    let hidden = toggles.iter().find(|e| e.action == "deactivate").unwrap();
    assert_eq!(hidden.old_values.as_ref().unwrap()["is_active"], true);
    assert_eq!(hidden.new_values.as_ref().unwrap()["is_active"], false);
    let shown = toggles.iter().find(|e| e.action == "activate").unwrap();
    assert_eq!(shown.old_values.as_ref().unwrap()["is_active"], false);
    assert_eq!(shown.new_values.as_ref().unwrap()["is_active"], true);
}
