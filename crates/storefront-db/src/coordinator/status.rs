//! # Order Status Transitions
//!
//! Moves an order along its lifecycle and keeps stock in step.
//!
//! The order row is locked before its status is read, so two admins acting
//! on the same order serialize: the second one sees the first one's result
//! and is rejected as stale instead of restoring stock twice.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use storefront_core::audit::NewAuditEntry;
use storefront_core::status::{plan_transition, TransitionPlan};
use storefront_core::stock::{check_availability, restore_plan, CheckPurpose};
use storefront_core::validation::validate_uuid;
use storefront_core::{CoreError, OrderStatus, StockEffect};

use crate::audit::AuditEmitter;
use crate::coordinator::{lock_snapshot, LedgerSettings};
use crate::error::LedgerResult;
use crate::pool::Database;

/// Result of a transition request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub order_id: String,
    /// Status before the request.
    pub from: OrderStatus,
    /// Status after the request.
    pub to: OrderStatus,
    /// `false` when the order was already in the target state.
    pub applied: bool,
    pub stock_effect: StockEffect,
    /// Units moved by the stock effect.
    pub units: i64,
}

/// Moves `order_id` from `from` to `to` in one atomic unit.
///
/// ## Errors
/// - `OrderNotFound`
/// - `InvalidTransition` when the edge is not allowed or the order is no
///   longer in `from`
/// - `InsufficientStock` when confirming under the confirmation commit
///   point and an item is short; nothing changes
#[instrument(skip(db, audit, settings))]
pub async fn transition_order_status(
    db: &Database,
    audit: &AuditEmitter,
    settings: &LedgerSettings,
    order_id: &str,
    from: OrderStatus,
    to: OrderStatus,
) -> LedgerResult<TransitionOutcome> {
    validate_uuid("order id", order_id)?;

    let mut tx = db.begin_atomic_unit().await?;
    let order = tx
        .get_order_for_update(order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    let plan = match plan_transition(order_id, order.status, from, to, settings.stock_commit_point) {
        Ok(plan) => plan,
        Err(e) => {
            warn!(live = %order.status, requested_from = %from, %to, "Transition rejected");
            return Err(e.into());
        }
    };

    let (from, to, effect) = match plan {
        TransitionPlan::NoOp => {
            tx.rollback().await?;
            info!(order_id, "Order already cancelled, nothing to do");
            return Ok(TransitionOutcome {
                order_id: order_id.to_string(),
                from: order.status,
                to: order.status,
                applied: false,
                stock_effect: StockEffect::None,
                units: 0,
            });
        }
        TransitionPlan::Apply { from, to, effect } => (from, to, effect),
    };

    let (units, stock_entry) = match effect {
        StockEffect::None => (0, None),
        StockEffect::Decrement => {
            let items = tx.get_order_items(order_id).await?;
            let ids: Vec<&str> = items.iter().map(|i| i.product_id.as_str()).collect();
            let snapshot = lock_snapshot(&mut tx, &ids).await?;
            let plan = check_availability(&items, &snapshot, CheckPurpose::Confirmation)?;
            tx.apply_stock_deltas(&plan).await?;
            (plan.units(), Some(NewAuditEntry::stock_deducted(order_id, plan.units())))
        }
        StockEffect::Restore => {
            let items = tx.get_order_items(order_id).await?;
            let plan = restore_plan(&items);
            tx.apply_stock_deltas(&plan).await?;
            (plan.units(), Some(NewAuditEntry::stock_restored(order_id, plan.units())))
        }
    };

    tx.update_order_status(order_id, to).await?;

    tx.after_commit(
        NewAuditEntry::order_status_changed(order_id, &order.customer_name, from, to)
            .with_actor(settings.audit_actor.clone()),
    );
    if let Some(entry) = stock_entry {
        tx.after_commit(entry);
    }
    tx.commit(audit).await?;

    info!(order_id, %from, %to, ?effect, units, "Order status changed");

    Ok(TransitionOutcome {
        order_id: order_id.to_string(),
        from,
        to,
        applied: true,
        stock_effect: effect,
        units,
    })
}
