//! # Order Status State Machine
//!
//! Decides whether a status change is legal and what it does to stock.
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ───confirm───► processing ───deliver───► delivered ■          │
//! │      │                       │                                          │
//! │      └──cancel──┐   ┌──cancel┘                                          │
//! │                 ▼   ▼                                                   │
//! │               cancelled ■                                               │
//! │                                                                         │
//! │   cancelled ──cancel──► cancelled     no-op, never restores twice       │
//! │   anything else                       InvalidTransition                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Commit Point
//! Stock leaves the shelf at exactly one point in an order's life.
//!
//! | Edge                    | OnPlacement (default) | OnConfirmation |
//! |-------------------------|-----------------------|----------------|
//! | placement               | decrement             | check only     |
//! | pending → processing    | none                  | decrement      |
//! | pending → cancelled     | restore               | none           |
//! | processing → cancelled  | restore               | restore        |
//! | processing → delivered  | none                  | none           |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::OrderStatus;

// =============================================================================
// Stock Commit Point
// =============================================================================

/// When an order's stock is taken out of inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockCommitPoint {
    /// Placing the order decrements stock; confirming is stock-neutral.
    #[default]
    OnPlacement,
    /// Placing only checks stock; confirming re-checks and decrements.
    OnConfirmation,
}

impl StockCommitPoint {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StockCommitPoint::OnPlacement => "on_placement",
            StockCommitPoint::OnConfirmation => "on_confirmation",
        }
    }

    /// Whether a freshly placed order already holds its stock.
    pub const fn decrements_on_placement(&self) -> bool {
        matches!(self, StockCommitPoint::OnPlacement)
    }

    /// Whether an order in `status` currently holds stock taken for it.
    pub const fn holds_stock(&self, status: OrderStatus) -> bool {
        match (self, status) {
            (StockCommitPoint::OnPlacement, OrderStatus::Pending) => true,
            (_, OrderStatus::Processing | OrderStatus::Delivered) => true,
            _ => false,
        }
    }
}

impl fmt::Display for StockCommitPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockCommitPoint {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_placement" | "placement" => Ok(StockCommitPoint::OnPlacement),
            "on_confirmation" | "confirmation" => Ok(StockCommitPoint::OnConfirmation),
            other => Err(ValidationError::InvalidFormat {
                field: "stock commit point".to_string(),
                reason: format!("expected on_placement or on_confirmation, got '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Transition Planning
// =============================================================================

/// What a legal transition does to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockEffect {
    /// Status change only.
    None,
    /// Re-check and take every item's quantity.
    Decrement,
    /// Give every item's quantity back.
    Restore,
}

/// The outcome of planning a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Already in the target state; nothing to write.
    NoOp,
    /// Write the new status and apply `effect` in the same atomic unit.
    Apply {
        from: OrderStatus,
        to: OrderStatus,
        effect: StockEffect,
    },
}

/// Whether `from -> to` is an edge of the state machine.
pub const fn is_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Pending, OrderStatus::Processing)
            | (OrderStatus::Pending, OrderStatus::Cancelled)
            | (OrderStatus::Processing, OrderStatus::Cancelled)
            | (OrderStatus::Processing, OrderStatus::Delivered)
    )
}

/// Plans a status change against the order's live status.
///
/// `expected` is the status the caller saw; when the live status has moved
/// on the request is stale and rejected. Cancelling a cancelled order is a
/// no-op whatever the caller saw.
///
/// ## Errors
/// `InvalidTransition` carrying the live status.
pub fn plan_transition(
    order_id: &str,
    live: OrderStatus,
    expected: OrderStatus,
    to: OrderStatus,
    commit_point: StockCommitPoint,
) -> CoreResult<TransitionPlan> {
    if live == OrderStatus::Cancelled && to == OrderStatus::Cancelled {
        return Ok(TransitionPlan::NoOp);
    }

    if live != expected || !is_allowed(live, to) {
        return Err(CoreError::InvalidTransition {
            order_id: order_id.to_string(),
            from: live,
            to,
        });
    }

    let effect = match to {
        OrderStatus::Processing if !commit_point.decrements_on_placement() => {
            StockEffect::Decrement
        }
        OrderStatus::Cancelled if commit_point.holds_stock(live) => StockEffect::Restore,
        _ => StockEffect::None,
    };

    Ok(TransitionPlan::Apply {
        from: live,
        to,
        effect,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn plan(live: OrderStatus, to: OrderStatus, point: StockCommitPoint) -> CoreResult<TransitionPlan> {
        plan_transition("o-1", live, live, to, point)
    }

    fn effect(live: OrderStatus, to: OrderStatus, point: StockCommitPoint) -> StockEffect {
        match plan(live, to, point).unwrap() {
            TransitionPlan::Apply { effect, .. } => effect,
            TransitionPlan::NoOp => panic!("expected an applied transition"),
        }
    }

    #[test]
    fn test_allowed_edges() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = matches!(
                    (from, to),
                    (Pending, Processing) | (Pending, Cancelled) | (Processing, Cancelled) | (Processing, Delivered)
                );
                assert_eq!(is_allowed(from, to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let point = StockCommitPoint::OnPlacement;
        assert!(matches!(
            plan(Pending, Delivered, point),
            Err(CoreError::InvalidTransition { from: Pending, to: Delivered, .. })
        ));
        assert!(plan(Cancelled, Processing, point).is_err());
        assert!(plan(Delivered, Cancelled, point).is_err());
        assert!(plan(Processing, Pending, point).is_err());
        assert!(plan(Pending, Pending, point).is_err());
    }

    #[test]
    fn test_cancel_on_cancelled_is_noop() {
        for point in [StockCommitPoint::OnPlacement, StockCommitPoint::OnConfirmation] {
            assert_eq!(plan(Cancelled, Cancelled, point).unwrap(), TransitionPlan::NoOp);
            // Stale view does not matter for the no-op.
            assert_eq!(
                plan_transition("o-1", Cancelled, Pending, Cancelled, point).unwrap(),
                TransitionPlan::NoOp
            );
        }
    }

    #[test]
    fn test_stale_expected_status_rejected() {
        let err = plan_transition("o-1", Processing, Pending, Processing, StockCommitPoint::OnPlacement)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                order_id: "o-1".into(),
                from: Processing,
                to: Processing,
            }
        );
    }

    #[test]
    fn test_effects_on_placement() {
        let p = StockCommitPoint::OnPlacement;
        assert_eq!(effect(Pending, Processing, p), StockEffect::None);
        assert_eq!(effect(Pending, Cancelled, p), StockEffect::Restore);
        assert_eq!(effect(Processing, Cancelled, p), StockEffect::Restore);
        assert_eq!(effect(Processing, Delivered, p), StockEffect::None);
    }

    #[test]
    fn test_effects_on_confirmation() {
        let p = StockCommitPoint::OnConfirmation;
        assert_eq!(effect(Pending, Processing, p), StockEffect::Decrement);
        assert_eq!(effect(Pending, Cancelled, p), StockEffect::None);
        assert_eq!(effect(Processing, Cancelled, p), StockEffect::Restore);
        assert_eq!(effect(Processing, Delivered, p), StockEffect::None);
    }

    #[test]
    fn test_commit_point_parsing() {
        assert_eq!("on_placement".parse::<StockCommitPoint>().unwrap(), StockCommitPoint::OnPlacement);
        assert_eq!(" ON_CONFIRMATION ".parse::<StockCommitPoint>().unwrap(), StockCommitPoint::OnConfirmation);
        assert!("sometimes".parse::<StockCommitPoint>().is_err());
        assert_eq!(StockCommitPoint::default(), StockCommitPoint::OnPlacement);
        assert_eq!(StockCommitPoint::OnConfirmation.to_string(), "on_confirmation");
    }
}
