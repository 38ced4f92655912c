//! # Coordinators
//!
//! The three mutating ledger operations. Each one validates its input,
//! opens exactly one atomic unit, asks the pure engines in
//! `storefront-core` what to write, writes it, and commits or rolls back
//! as a whole.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  placement::place_order          validate → lock → check → price →     │
//! │                                  insert order + items → decrement      │
//! │                                                                         │
//! │  status::transition_order_status lock order → plan → restore/decrement │
//! │                                  → status                              │
//! │                                                                         │
//! │  inbound::record_stock_inbound   lock product → WAC → record + stock   │
//! │                                  + cost                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use storefront_core::stock::StockSnapshot;
use storefront_core::{StockCommitPoint, DEFAULT_AUDIT_ACTOR, DEFAULT_MIN_PHONE_LENGTH};

use crate::config::StorefrontConfig;
use crate::error::DbResult;
use crate::ledger::LedgerTx;

pub mod inbound;
pub mod placement;
pub mod status;

/// Business settings shared by the coordinators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    pub stock_commit_point: StockCommitPoint,
    pub min_phone_length: usize,
    /// Actor recorded on back-office audit entries.
    pub audit_actor: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            stock_commit_point: StockCommitPoint::default(),
            min_phone_length: DEFAULT_MIN_PHONE_LENGTH,
            audit_actor: DEFAULT_AUDIT_ACTOR.to_string(),
        }
    }
}

impl LedgerSettings {
    pub fn with_commit_point(mut self, point: StockCommitPoint) -> Self {
        self.stock_commit_point = point;
        self
    }
}

impl From<&StorefrontConfig> for LedgerSettings {
    fn from(config: &StorefrontConfig) -> Self {
        LedgerSettings {
            stock_commit_point: config.stock_commit_point,
            min_phone_length: config.min_phone_length,
            audit_actor: config.audit_actor.clone(),
        }
    }
}

/// Locks every distinct product in `ids` and snapshots it.
///
/// Missing products are left out so the stock engine reports them in
/// request order.
pub(crate) async fn lock_snapshot(tx: &mut LedgerTx, ids: &[&str]) -> DbResult<StockSnapshot> {
    let mut snapshot = StockSnapshot::new();
    for &id in ids {
        if snapshot.get(id).is_some() {
            continue;
        }
        if let Some(product) = tx.get_product_for_update(id).await? {
            snapshot.insert((&product).into());
        }
    }
    Ok(snapshot)
}
