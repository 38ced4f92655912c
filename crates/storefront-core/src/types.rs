//! # Domain Types
//!
//! Core domain types used throughout the storefront ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  price          │   │  customer snap  │   │  product_id(FK) │       │
//! │  │  cost_price     │   │  total_amount   │   │  unit_price     │       │
//! │  │  stock_quantity │   │  status         │   │  subtotal       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐                          │
//! │  │ StockInboundRecord  │   │  OrderStatus    │                          │
//! │  │  ─────────────────  │   │  ─────────────  │                          │
//! │  │  quantity_added     │   │  Pending        │                          │
//! │  │  cost_price_at_time │   │  Processing     │                          │
//! │  │  (append-only)      │   │  Delivered  ■   │                          │
//! │  └─────────────────────┘   │  Cancelled  ■   │  ■ = terminal            │
//! │                            └─────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Orders copy the customer's name/phone/address and each item copies the
//! unit price at order time. Later product edits never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::cost::UnitCost;
use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the storefront and in audit messages.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Catalog category.
    pub category: String,

    /// Current selling price.
    pub price: Money,

    /// Weighted-average unit cost. Only the stock inbound path writes it.
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    #[ts(as = "String")]
    pub cost_price: UnitCost,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,

    /// Whether the product can be ordered.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Stock valued at the current average cost, in whole units.
    ///
    /// `None` if the value does not fit in [`Money`].
    pub fn stock_value(&self) -> Option<Money> {
        self.cost_price.checked_value_of(self.stock_quantity)
    }
}

/// Catalog entry to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Money,
    /// Opening unit cost; later changes go through stock inbound.
    #[ts(as = "String")]
    pub cost_price: UnitCost,
    pub stock_quantity: i64,
    pub is_active: bool,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order.
///
/// ```text
///   pending ──► processing ──► delivered ■
///      │             │
///      └─────────────┴──────► cancelled ■
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting confirmation.
    Pending,
    /// Confirmed and out for delivery.
    Processing,
    /// Handed to the customer.
    Delivered,
    /// Cancelled; stock taken for it has been returned.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Storage and wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Back-office label used in audit descriptions.
    pub const fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Awaiting confirmation",
            OrderStatus::Processing => "Out for delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Terminal statuses accept no further transition.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown order status '{}'", s),
            })
    }
}

// =============================================================================
// Customer & Cart Input
// =============================================================================

/// Customer details captured at checkout.
///
/// Customers are not entities; the back office groups orders by phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub notes: Option<String>,
}

/// One requested cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order with its customer snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub notes: Option<String>,
    /// Sum of item subtotals at creation. Never recomputed.
    pub total_amount: Money,
    pub status: OrderStatus,
    /// Caller-supplied key that makes placement retry-safe.
    pub idempotency_key: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Short human code used in back-office messages (first 8 id chars).
    pub fn code(&self) -> String {
        order_code(&self.id)
    }
}

/// Short human code for an order id.
pub fn order_code(order_id: &str) -> String {
    order_id.chars().take(8).collect::<String>().to_uppercase()
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item of an order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Product price at order time (frozen).
    pub unit_price: Money,
    /// `quantity * unit_price`.
    pub subtotal: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An order together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetails {
    /// Checks `total_amount == Σ subtotal` and `subtotal == quantity * unit_price`.
    pub fn totals_consistent(&self) -> bool {
        let lines_ok = self
            .items
            .iter()
            .all(|item| item.unit_price.multiply_quantity(item.quantity) == item.subtotal);
        let total: Money = self.items.iter().map(|item| item.subtotal).sum();
        lines_ok && total == self.order.total_amount
    }
}

// =============================================================================
// Stock Inbound
// =============================================================================

/// One batch of inventory received. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockInboundRecord {
    pub id: String,
    pub product_id: String,
    pub quantity_added: i64,
    /// Unit cost of this batch, independent of the running average.
    pub cost_price_at_time: Money,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockInboundRecord {
    /// Total value of the batch.
    pub fn batch_value(&self) -> Money {
        self.cost_price_at_time.multiply_quantity(self.quantity_added)
    }
}

/// Totals over a slice of inbound history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundStats {
    pub total_records: usize,
    pub total_quantity: i64,
    pub total_value: Money,
}

impl InboundStats {
    pub fn from_records(records: &[StockInboundRecord]) -> Self {
        InboundStats {
            total_records: records.len(),
            total_quantity: records.iter().map(|r| r.quantity_added).sum(),
            total_value: records.iter().map(StockInboundRecord::batch_value).sum(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, unit_price: i64) -> OrderItem {
        OrderItem {
            id: "i".to_string(),
            order_id: "o".to_string(),
            product_id: "p".to_string(),
            quantity,
            unit_price: Money::from_units(unit_price),
            subtotal: Money::from_units(unit_price * quantity),
            created_at: Utc::now(),
        }
    }

    fn order(total: i64) -> Order {
        let now = Utc::now();
        Order {
            id: "4f1c2a9e-0000-4000-8000-000000000000".to_string(),
            customer_name: "Lan".to_string(),
            customer_phone: "0901234567".to_string(),
            customer_address: "12 Hang Bac".to_string(),
            notes: None,
            total_amount: Money::from_units(total),
            status: OrderStatus::Pending,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_code() {
        assert_eq!(order(0).code(), "4F1C2A9E");
        assert_eq!(order_code("ab"), "AB");
    }

    #[test]
    fn test_totals_consistent() {
        let details = OrderDetails {
            order: order(350),
            items: vec![item(2, 100), item(1, 150)],
        };
        assert!(details.totals_consistent());

        let broken = OrderDetails {
            order: order(400),
            items: vec![item(2, 100), item(1, 150)],
        };
        assert!(!broken.totals_consistent());
    }

    #[test]
    fn test_inbound_stats() {
        let now = Utc::now();
        let records = vec![
            StockInboundRecord {
                id: "a".into(),
                product_id: "p".into(),
                quantity_added: 10,
                cost_price_at_time: Money::from_units(100),
                supplier: None,
                notes: None,
                created_at: now,
            },
            StockInboundRecord {
                id: "b".into(),
                product_id: "p".into(),
                quantity_added: 5,
                cost_price_at_time: Money::from_units(200),
                supplier: Some("Minh Phat".into()),
                notes: None,
                created_at: now,
            },
        ];
        let stats = InboundStats::from_records(&records);
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_quantity, 15);
        assert_eq!(stats.total_value, Money::from_units(2000));
    }
}
