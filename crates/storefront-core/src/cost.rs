//! # Cost Basis Calculator
//!
//! Weighted-average cost (WAC) of a product's stock.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current_qty == 0  ──►  new_avg = incoming_unit_cost                    │
//! │                                                                         │
//! │  otherwise:                                                             │
//! │                                                                         │
//! │             current_qty × current_avg + incoming_qty × incoming_cost    │
//! │  new_avg = ──────────────────────────────────────────────────────────  │
//! │                        current_qty + incoming_qty                       │
//! │                                                                         │
//! │  Computed in Decimal, kept to COST_SCALE places (half away from zero). │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Selling prices and batch costs are whole [`Money`] units. The average is
//! not: one unit at 1 plus one unit at 2 averages 1.5, and rounding that
//! to 2 would overstate the value of every unit on the shelf. The average
//! therefore lives in its own type, [`UnitCost`], stored as decimal text.
//!
//! ## Example
//! ```rust
//! use storefront_core::cost::{weighted_average_cost, UnitCost};
//! use storefront_core::Money;
//!
//! let avg = weighted_average_cost(0, UnitCost::from_units(999), 7, Money::from_units(120)).unwrap();
//! assert_eq!(avg, UnitCost::from_units(120));
//!
//! let avg = weighted_average_cost(1, UnitCost::from_units(1), 1, Money::from_units(2)).unwrap();
//! assert_eq!(avg.to_string(), "1.5");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Decimal places kept on an average unit cost.
pub const COST_SCALE: u32 = 4;

// =============================================================================
// Unit Cost
// =============================================================================

/// Average cost of one unit, with fractional precision.
///
/// Always normalized: at most [`COST_SCALE`] decimal places and no trailing
/// zeros, so equal costs compare equal and print the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct UnitCost(Decimal);

impl UnitCost {
    pub const ZERO: UnitCost = UnitCost(Decimal::ZERO);

    /// Rounds `value` to [`COST_SCALE`] places.
    pub fn new(value: Decimal) -> Self {
        UnitCost(
            value
                .round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }

    pub fn from_units(units: i64) -> Self {
        UnitCost::new(Decimal::from(units))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// `quantity` units valued at this cost, rounded to whole money units.
    ///
    /// Returns `None` if the result does not fit.
    pub fn checked_value_of(&self, quantity: i64) -> Option<Money> {
        let total = self.0.checked_mul(Decimal::from(quantity))?;
        let whole = total.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        whole.to_i64().map(Money::from_units)
    }
}

impl From<Money> for UnitCost {
    fn from(money: Money) -> Self {
        UnitCost::from_units(money.units())
    }
}

impl From<Decimal> for UnitCost {
    fn from(value: Decimal) -> Self {
        UnitCost::new(value)
    }
}

impl From<UnitCost> for Decimal {
    fn from(cost: UnitCost) -> Self {
        cost.0
    }
}

/// Column decoding: costs are stored as decimal text.
impl TryFrom<String> for UnitCost {
    type Error = rust_decimal::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for UnitCost {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(UnitCost::new)
    }
}

impl fmt::Display for UnitCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Weighted Average
// =============================================================================

/// Blends a received batch into the running average cost.
///
/// A non-positive `current_qty` means there is no basis to blend with, so
/// the batch cost becomes the average.
///
/// ## Errors
/// `AmountOverflow` if the stock value exceeds the decimal range.
pub fn weighted_average_cost(
    current_qty: i64,
    current_avg: UnitCost,
    incoming_qty: i64,
    incoming_unit_cost: Money,
) -> CoreResult<UnitCost> {
    let incoming = Decimal::from(incoming_unit_cost.units());
    if current_qty <= 0 {
        return Ok(UnitCost::new(incoming));
    }

    let overflow = || CoreError::AmountOverflow("average cost");
    let current_value = current_avg
        .as_decimal()
        .checked_mul(Decimal::from(current_qty))
        .ok_or_else(overflow)?;
    let incoming_value = incoming
        .checked_mul(Decimal::from(incoming_qty))
        .ok_or_else(overflow)?;
    let numerator = current_value
        .checked_add(incoming_value)
        .ok_or_else(overflow)?;

    let denominator = current_qty as i128 + incoming_qty as i128;
    if denominator <= 0 {
        return Ok(current_avg);
    }

    numerator
        .checked_div(Decimal::from_i128_with_scale(denominator, 0))
        .map(UnitCost::new)
        .ok_or_else(overflow)
}

/// Quantity on hand and its average unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBasis {
    pub quantity: i64,
    pub avg_cost: UnitCost,
}

impl CostBasis {
    pub fn new(quantity: i64, avg_cost: UnitCost) -> Self {
        CostBasis { quantity, avg_cost }
    }

    /// Basis after receiving `quantity` units at `unit_cost`.
    pub fn receive(self, quantity: i64, unit_cost: Money) -> CoreResult<CostBasis> {
        Ok(CostBasis {
            quantity: self
                .quantity
                .checked_add(quantity)
                .ok_or(CoreError::AmountOverflow("stock quantity"))?,
            avg_cost: weighted_average_cost(self.quantity, self.avg_cost, quantity, unit_cost)?,
        })
    }

    /// Stock valued at the average cost, in whole units.
    pub fn value(&self) -> CoreResult<Money> {
        self.avg_cost
            .checked_value_of(self.quantity)
            .ok_or(CoreError::AmountOverflow("stock value"))
    }
}
