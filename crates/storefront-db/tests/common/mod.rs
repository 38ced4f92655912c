//! Shared fixtures for the ledger integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use storefront_core::{CartLine, CustomerInfo, Money, NewProduct, Product, StockCommitPoint};
use storefront_db::{AuditEmitter, Database, DbConfig, LedgerSettings, PlaceOrderRequest, Storefront};
use uuid::Uuid;

/// Isolated in-memory store.
pub async fn store(point: StockCommitPoint) -> Storefront {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let audit = AuditEmitter::spawn(db.audit_logs(), 64);
    Storefront::new(db, audit, LedgerSettings::default().with_commit_point(point))
}

/// File-backed store with several connections, for tests that need real
/// concurrency. The file lives in the temp dir and is removed by
/// [`cleanup`].
pub async fn file_store(point: StockCommitPoint) -> (Storefront, PathBuf) {
    let path = std::env::temp_dir().join(format!("storefront-{}.db", Uuid::new_v4()));
    let config = DbConfig::new(path.clone())
        .max_connections(4)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();
    let audit = AuditEmitter::spawn(db.audit_logs(), 64);
    let store = Storefront::new(db, audit, LedgerSettings::default().with_commit_point(point));
    (store, path)
}

pub async fn cleanup(store: Storefront, path: PathBuf) {
    store.audit().flush().await;
    store.database().close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

pub async fn product(store: &Storefront, name: &str, price: i64, stock: i64) -> Product {
    store
        .create_product(&NewProduct {
            name: name.to_string(),
            description: None,
            category: "coffee".to_string(),
            price: Money::from_units(price),
            cost_price: Money::from_units(price / 2).into(),
            stock_quantity: stock,
            is_active: true,
        })
        .await
        .unwrap()
}

pub async fn stock_of(store: &Storefront, product_id: &str) -> i64 {
    store.get_product(product_id).await.unwrap().stock_quantity
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Nguyen Thi Lan".to_string(),
        phone: "0901234567".to_string(),
        address: "12 Ly Tu Trong, District 1".to_string(),
        notes: None,
    }
}

pub fn order(lines: &[(&str, i64)]) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer: customer(),
        items: lines.iter().map(|(id, qty)| CartLine::new(*id, *qty)).collect(),
        idempotency_key: None,
    }
}
