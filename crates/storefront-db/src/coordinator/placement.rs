//! # Order Placement
//!
//! Turns a checkout into an order, or into nothing at all.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate customer + cart          (no store access)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ─► lock every referenced product                                 │
//! │       │                                                                 │
//! │       ├── idempotency key already used? ─► ROLLBACK, replay receipt     │
//! │       ▼                                                                 │
//! │  stock engine on live rows ─► price lines                               │
//! │       ▼                                                                 │
//! │  INSERT order (pending) ─► INSERT items ─► decrement stock*             │
//! │       ▼                                                                 │
//! │  COMMIT ─► order.created                                                │
//! │                                                                         │
//! │  * only when stock is committed on placement                           │
//! │  Any error before COMMIT leaves no order, no items, no stock change.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use storefront_core::audit::NewAuditEntry;
use storefront_core::pricing::price_lines;
use storefront_core::stock::{check_availability, CheckPurpose, StockPlan, StockSnapshot};
use storefront_core::validation::{optional_text, validate_cart, validate_customer};
use storefront_core::{CartLine, CustomerInfo, Money, Order, OrderItem, OrderStatus};

use crate::audit::AuditEmitter;
use crate::coordinator::{lock_snapshot, LedgerSettings};
use crate::error::LedgerResult;
use crate::pool::Database;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// A checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer: CustomerInfo,
    pub items: Vec<CartLine>,
    /// Retrying with the same key returns the first order instead of
    /// placing a second one.
    pub idempotency_key: Option<String>,
}

/// What a successful checkout returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub total_amount: Money,
    pub item_count: usize,
    /// `true` when an earlier order with the same idempotency key was returned.
    pub replayed: bool,
}

/// Places an order atomically.
///
/// ## Errors
/// - `Validation` for malformed input, before any store access
/// - `ProductNotFound` / `ProductInactive` / `InsufficientStock` for the
///   first failing line against live stock
/// - `Persistence` if the store fails; nothing is written
#[instrument(skip_all, fields(lines = request.items.len()))]
pub async fn place_order(
    db: &Database,
    audit: &AuditEmitter,
    settings: &LedgerSettings,
    request: &PlaceOrderRequest,
) -> LedgerResult<OrderReceipt> {
    let customer = validate_customer(&request.customer, settings.min_phone_length)?;
    validate_cart(&request.items)?;
    let idempotency_key = optional_text(
        "idempotency key",
        request.idempotency_key.as_deref(),
        MAX_IDEMPOTENCY_KEY_LEN,
    )?;

    let mut tx = db.begin_atomic_unit().await?;
    let ids: Vec<&str> = request.items.iter().map(|l| l.product_id.as_str()).collect();
    let snapshot = lock_snapshot(&mut tx, &ids).await?;

    if let Some(key) = idempotency_key.as_deref() {
        if let Some(existing) = tx.find_order_by_idempotency_key(key).await? {
            let item_count = tx.get_order_items(&existing.id).await?.len();
            tx.rollback().await?;
            info!(order_id = %existing.id, "Replayed order for idempotency key");
            return Ok(OrderReceipt {
                order_id: existing.id,
                total_amount: existing.total_amount,
                item_count,
                replayed: true,
            });
        }
    }

    let plan = check_availability(&request.items, &snapshot, CheckPurpose::NewOrder)?;
    let priced = price_lines(&request.items, &snapshot)?;

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4().to_string(),
        customer_name: customer.name,
        customer_phone: customer.phone,
        customer_address: customer.address,
        notes: customer.notes,
        total_amount: priced.total_amount,
        status: OrderStatus::Pending,
        idempotency_key,
        created_at: now,
        updated_at: now,
    };
    let items: Vec<OrderItem> = priced
        .lines
        .into_iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
            created_at: now,
        })
        .collect();

    tx.insert_order(&order).await?;
    tx.insert_order_items(&items).await?;
    if settings.stock_commit_point.decrements_on_placement() {
        tx.apply_stock_deltas(&plan).await?;
    } else {
        debug!(units = plan.units(), "Stock checked, decrement deferred to confirmation");
    }

    tx.after_commit(NewAuditEntry::order_created(
        &order.id,
        &order.customer_name,
        order.total_amount,
        items.len(),
    ));
    tx.commit(audit).await?;

    info!(
        order_id = %order.id,
        total = %order.total_amount,
        items = items.len(),
        "Order placed"
    );

    Ok(OrderReceipt {
        order_id: order.id,
        total_amount: order.total_amount,
        item_count: items.len(),
        replayed: false,
    })
}

/// Advisory stock check for the storefront cart.
///
/// Reads without locking, so the answer can be stale by the time the
/// customer checks out; placement re-checks authoritatively.
#[instrument(skip_all, fields(lines = items.len()))]
pub async fn check_stock_availability(db: &Database, items: &[CartLine]) -> LedgerResult<StockPlan> {
    validate_cart(items)?;

    let ids: Vec<&str> = items.iter().map(|l| l.product_id.as_str()).collect();
    let products = db.products().get_many(&ids).await?;
    let snapshot: StockSnapshot = products.iter().collect();

    Ok(check_availability(items, &snapshot, CheckPurpose::NewOrder)?)
}
