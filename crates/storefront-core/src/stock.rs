//! # Stock Invariant Engine
//!
//! Decides whether live stock covers a request and computes the stock
//! deltas a transaction must apply. Pure: it reads a snapshot and returns a
//! plan, the caller applies the plan inside its atomic unit.
//!
//! ## Check Order (per line, input order, fail fast)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line ──► product exists? ──► active? ──► remaining >= requested?      │
//! │              │                  │                │                      │
//! │              ▼                  ▼                ▼                      │
//! │      ProductNotFound    ProductInactive   InsufficientStock             │
//! │                                                                         │
//! │  First violation wins. Later lines are not inspected.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines naming the same product draw from one running balance, so two
//! lines of 3 against a stock of 5 fail on the second line.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, OrderItem, Product};

// =============================================================================
// Inputs
// =============================================================================

/// Anything that asks for a quantity of one product.
pub trait StockRequest {
    fn product_id(&self) -> &str;
    fn quantity(&self) -> i64;
}

impl StockRequest for CartLine {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

impl StockRequest for OrderItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// Why stock is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPurpose {
    /// A new order: the product must be active.
    NewOrder,
    /// Confirming an order already accepted: an item that was deactivated
    /// after the order was placed may still ship if stock covers it.
    Confirmation,
}

/// Stock facts about one product, as read inside the atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: String,
    pub name: String,
    pub stock_quantity: i64,
    pub is_active: bool,
    pub price: Money,
}

impl From<&Product> for StockLevel {
    fn from(product: &Product) -> Self {
        StockLevel {
            product_id: product.id.clone(),
            name: product.name.clone(),
            stock_quantity: product.stock_quantity,
            is_active: product.is_active,
            price: product.price,
        }
    }
}

/// Point-in-time view of the products a request touches.
#[derive(Debug, Clone, Default)]
pub struct StockSnapshot {
    levels: HashMap<String, StockLevel>,
}

impl StockSnapshot {
    pub fn new() -> Self {
        StockSnapshot::default()
    }

    pub fn insert(&mut self, level: StockLevel) {
        self.levels.insert(level.product_id.clone(), level);
    }

    pub fn get(&self, product_id: &str) -> Option<&StockLevel> {
        self.levels.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl<'a> FromIterator<&'a Product> for StockSnapshot {
    fn from_iter<I: IntoIterator<Item = &'a Product>>(iter: I) -> Self {
        let mut snapshot = StockSnapshot::new();
        for product in iter {
            snapshot.insert(StockLevel::from(product));
        }
        snapshot
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// Signed change to one product's stock. Negative takes stock out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub product_id: String,
    pub delta: i64,
}

/// The stock movements one transaction must apply, one entry per product
/// in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPlan {
    deltas: Vec<StockDelta>,
}

impl StockPlan {
    pub fn deltas(&self) -> &[StockDelta] {
        &self.deltas
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Total units moved (absolute).
    pub fn units(&self) -> i64 {
        self.deltas.iter().map(|d| d.delta.abs()).sum()
    }

    fn add(&mut self, product_id: &str, delta: i64) {
        match self.deltas.iter_mut().find(|d| d.product_id == product_id) {
            Some(existing) => existing.delta += delta,
            None => self.deltas.push(StockDelta {
                product_id: product_id.to_string(),
                delta,
            }),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Checks every request against the snapshot and returns the decrement plan.
///
/// ## Errors
/// The first violating line, in input order:
/// `ProductNotFound`, `ProductInactive` (new orders only),
/// `InsufficientStock` carrying the name, the units still available to this
/// line and the units it asked for.
pub fn check_availability<R: StockRequest>(
    requests: &[R],
    snapshot: &StockSnapshot,
    purpose: CheckPurpose,
) -> CoreResult<StockPlan> {
    let mut plan = StockPlan::default();
    let mut remaining: HashMap<&str, i64> = HashMap::new();

    for request in requests {
        let product_id = request.product_id();
        let level = snapshot
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if purpose == CheckPurpose::NewOrder && !level.is_active {
            return Err(CoreError::ProductInactive {
                product_id: level.product_id.clone(),
                name: level.name.clone(),
            });
        }

        let available = remaining
            .entry(level.product_id.as_str())
            .or_insert(level.stock_quantity);
        if *available < request.quantity() {
            return Err(CoreError::InsufficientStock {
                product_id: level.product_id.clone(),
                product_name: level.name.clone(),
                available: *available,
                requested: request.quantity(),
            });
        }
        *available -= request.quantity();
        plan.add(product_id, -request.quantity());
    }

    Ok(plan)
}

/// Builds the plan that gives back every item's quantity.
///
/// Restores are unconditional: there is no capacity ceiling on stock.
pub fn restore_plan<R: StockRequest>(requests: &[R]) -> StockPlan {
    let mut plan = StockPlan::default();
    for request in requests {
        plan.add(request.product_id(), request.quantity());
    }
    plan
}

// =============================================================================
// Unit Tests
// =============================================================================
