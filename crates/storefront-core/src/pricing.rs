//! # Order Pricing
//!
//! Turns cart lines into priced order lines using the prices read inside
//! the placement transaction. Each cart line becomes one order item; the
//! order total is the exact sum of the item subtotals.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::stock::{StockRequest, StockSnapshot};

/// One cart line with its frozen price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Priced lines plus their total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total_amount: Money,
}

/// Prices every line from the snapshot.
///
/// ## Errors
/// - `ProductNotFound` if a line's product is not in the snapshot
/// - `AmountOverflow` if a subtotal or the total does not fit
pub fn price_lines<R: StockRequest>(
    requests: &[R],
    snapshot: &StockSnapshot,
) -> CoreResult<PricedOrder> {
    let mut lines = Vec::with_capacity(requests.len());
    let mut total = Money::zero();

    for request in requests {
        let level = snapshot
            .get(request.product_id())
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id().to_string()))?;

        let subtotal = level
            .price
            .checked_multiply_quantity(request.quantity())
            .ok_or(CoreError::AmountOverflow("line subtotal"))?;
        total = total
            .checked_add(subtotal)
            .ok_or(CoreError::AmountOverflow("order total"))?;

        lines.push(PricedLine {
            product_id: level.product_id.clone(),
            quantity: request.quantity(),
            unit_price: level.price,
            subtotal,
        });
    }

    Ok(PricedOrder {
        lines,
        total_amount: total,
    })
}
