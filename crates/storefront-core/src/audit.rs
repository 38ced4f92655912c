//! # Audit Entries
//!
//! Taxonomy and builders for the append-only audit trail. Builders only
//! shape data; writing is the job of the emitter in `storefront-db`.
//!
//! ## Event Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  event_type             entity_type   written after                     │
//! │  ────────────────────── ───────────── ─────────────────────────────────  │
//! │  order.created          order         placement commit                  │
//! │  order.status_changed   order         every applied transition          │
//! │  system.event           system        stock restored / deducted         │
//! │  stock.inbound          product       inbound batch commit              │
//! │  product.created        product       catalog insert                    │
//! │  product.price_updated  product       price edit                        │
//! │  product.stock_updated  product       plain restock                     │
//! │  product.status_changed product       hide / show                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cost::CostBasis;
use crate::money::Money;
use crate::types::{order_code, OrderStatus, StockInboundRecord};
use crate::{DEFAULT_AUDIT_ACTOR, SYSTEM_ACTOR};

/// Dotted audit event types.
pub mod event {
    pub const ORDER_CREATED: &str = "order.created";
    pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
    pub const SYSTEM_EVENT: &str = "system.event";
    pub const STOCK_INBOUND: &str = "stock.inbound";
    pub const PRODUCT_CREATED: &str = "product.created";
    pub const PRODUCT_PRICE_UPDATED: &str = "product.price_updated";
    pub const PRODUCT_STOCK_UPDATED: &str = "product.stock_updated";
    pub const PRODUCT_STATUS_CHANGED: &str = "product.status_changed";
}

/// Entity types an entry can point at.
pub mod entity {
    pub const ORDER: &str = "order";
    pub const PRODUCT: &str = "product";
    pub const SYSTEM: &str = "system";
}

// =============================================================================
// Entry Types
// =============================================================================

/// An audit entry waiting to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub actor: String,
    pub action: String,
    pub description: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub metadata: Option<Value>,
}

/// A stored audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub actor: String,
    pub action: String,
    pub description: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    fn base(event_type: &str, entity_type: &str, entity_id: Option<&str>, action: &str) -> Self {
        NewAuditEntry {
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.map(str::to_string),
            actor: DEFAULT_AUDIT_ACTOR.to_string(),
            action: action.to_string(),
            description: String::new(),
            old_values: None,
            new_values: None,
            metadata: None,
        }
    }

    /// Replaces the actor.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// A storefront checkout created an order. The customer is the actor.
    pub fn order_created(
        order_id: &str,
        customer_name: &str,
        total_amount: Money,
        item_count: usize,
    ) -> Self {
        let mut entry = Self::base(event::ORDER_CREATED, entity::ORDER, Some(order_id), "create");
        entry.actor = customer_name.to_string();
        entry.description = format!(
            "New order #{} from {}, total {}",
            order_code(order_id),
            customer_name,
            total_amount
        );
        entry.new_values = Some(json!({
            "status": OrderStatus::Pending,
            "total_amount": total_amount,
            "item_count": item_count,
        }));
        entry
    }

    /// An order moved between statuses.
    pub fn order_status_changed(
        order_id: &str,
        customer_name: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Self {
        let mut entry = Self::base(
            event::ORDER_STATUS_CHANGED,
            entity::ORDER,
            Some(order_id),
            "status_change",
        );
        entry.description = format!(
            "Order #{} ({}): {} -> {}",
            order_code(order_id),
            customer_name,
            from.label(),
            to.label()
        );
        entry.old_values = Some(json!({ "status": from }));
        entry.new_values = Some(json!({ "status": to }));
        entry
    }

    /// Stock moved as a side effect of a transition.
    pub fn stock_restored(order_id: &str, units: i64) -> Self {
        Self::system_stock_event(order_id, units, "stock_restore", "Stock restored")
    }

    pub fn stock_deducted(order_id: &str, units: i64) -> Self {
        Self::system_stock_event(order_id, units, "stock_deduct", "Stock deducted")
    }

    fn system_stock_event(order_id: &str, units: i64, action: &str, verb: &str) -> Self {
        let mut entry = Self::base(event::SYSTEM_EVENT, entity::SYSTEM, Some(order_id), action)
            .with_actor(SYSTEM_ACTOR);
        entry.description = format!("{} for order #{} ({} units)", verb, order_code(order_id), units);
        entry.metadata = Some(json!({ "order_id": order_id, "units": units }));
        entry
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// A batch of stock was received.
    pub fn stock_inbound(
        record: &StockInboundRecord,
        product_name: &str,
        before: CostBasis,
        after: CostBasis,
    ) -> Self {
        let mut entry = Self::base(
            event::STOCK_INBOUND,
            entity::PRODUCT,
            Some(&record.product_id),
            "inbound",
        );
        entry.description = match record.supplier.as_deref() {
            Some(supplier) => format!(
                "Received {} x {} at {} from {}",
                record.quantity_added, product_name, record.cost_price_at_time, supplier
            ),
            None => format!(
                "Received {} x {} at {}",
                record.quantity_added, product_name, record.cost_price_at_time
            ),
        };
        entry.old_values = Some(json!({
            "stock_quantity": before.quantity,
            "cost_price": before.avg_cost,
        }));
        entry.new_values = Some(json!({
            "stock_quantity": after.quantity,
            "cost_price": after.avg_cost,
        }));
        entry.metadata = Some(json!({
            "inbound_id": record.id,
            "quantity_added": record.quantity_added,
            "cost_price_at_time": record.cost_price_at_time,
            "supplier": record.supplier,
        }));
        entry
    }

    pub fn product_created(product_id: &str, product_name: &str, price: Money, stock: i64) -> Self {
        let mut entry = Self::base(event::PRODUCT_CREATED, entity::PRODUCT, Some(product_id), "create");
        entry.description = format!("Added product {}", product_name);
        entry.new_values = Some(json!({ "price": price, "stock_quantity": stock }));
        entry
    }

    pub fn product_price_updated(product_id: &str, product_name: &str, old: Money, new: Money) -> Self {
        let mut entry =
            Self::base(event::PRODUCT_PRICE_UPDATED, entity::PRODUCT, Some(product_id), "update");
        entry.description = format!("Price of {} changed from {} to {}", product_name, old, new);
        entry.old_values = Some(json!({ "price": old }));
        entry.new_values = Some(json!({ "price": new }));
        entry
    }

    pub fn product_stock_updated(product_id: &str, product_name: &str, old: i64, new: i64) -> Self {
        let mut entry =
            Self::base(event::PRODUCT_STOCK_UPDATED, entity::PRODUCT, Some(product_id), "update");
        entry.description = format!("Stock of {} changed from {} to {}", product_name, old, new);
        entry.old_values = Some(json!({ "stock_quantity": old }));
        entry.new_values = Some(json!({ "stock_quantity": new }));
        entry
    }

    /// A product was hidden from or returned to the storefront.
    pub fn product_status_changed(
        product_id: &str,
        product_name: &str,
        was_active: bool,
        is_active: bool,
    ) -> Self {
        let action = if is_active { "activate" } else { "deactivate" };
        let mut entry =
            Self::base(event::PRODUCT_STATUS_CHANGED, entity::PRODUCT, Some(product_id), action);
        entry.description = if is_active {
            format!("Product {} is available again", product_name)
        } else {
            format!("Product {} was hidden from the storefront", product_name)
        };
        entry.old_values = Some(json!({ "is_active": was_active }));
        entry.new_values = Some(json!({ "is_active": is_active }));
        entry
    }
}
