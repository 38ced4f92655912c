//! # storefront-db: Ledger Store for the Storefront
//!
//! SQLite persistence for the order and inventory ledger. Every transaction
//! boundary of the system lives in this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Ledger Data Flow                        │
//! │                                                                         │
//! │  Checkout / Admin action                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 storefront-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │  Storefront  │──►│ Coordinators │──►│    LedgerTx      │   │   │
//! │  │   │  (facade)    │   │ place/status │   │ (atomic unit)    │   │   │
//! │  │   │              │   │ /inbound     │   └────────┬─────────┘   │   │
//! │  │   └──────┬───────┘   └──────┬───────┘            │ commit      │   │
//! │  │          │ reads            │ pure rules         ▼             │   │
//! │  │   ┌──────▼───────┐   ┌──────▼───────┐   ┌──────────────────┐   │   │
//! │  │   │ Repositories │   │storefront-   │   │  AuditEmitter    │   │   │
//! │  │   │              │   │core          │   │  (background)    │   │   │
//! │  │   └──────────────┘   └──────────────┘   └──────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite (WAL)  products · orders · order_items ·               │   │
//! │  │                 stock_inbound · audit_logs                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`storefront`] - The facade callers hold
//! - [`coordinator`] - Order placement, status transitions, stock inbound
//! - [`ledger`] - The atomic unit (`LedgerTx`)
//! - [`audit`] - Best-effort background audit writer
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store and ledger error types
//! - [`repository`] - Reads and single-statement writes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_db::{Storefront, StorefrontConfig};
//!
//! let store = Storefront::open(&StorefrontConfig::from_env()?).await?;
//! let receipt = store.place_order(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod storefront;

// =============================================================================
// Re-exports
// =============================================================================

pub use audit::{AuditEmitter, AuditError, AuditSink};
pub use config::{ConfigError, StorefrontConfig};
pub use coordinator::inbound::{InboundHistory, StockInboundOutcome, StockInboundRequest};
pub use coordinator::placement::{OrderReceipt, PlaceOrderRequest};
pub use coordinator::status::TransitionOutcome;
pub use coordinator::LedgerSettings;
pub use error::{DbError, DbResult, ErrorKind, LedgerError, LedgerResult};
pub use ledger::LedgerTx;
pub use pool::{Database, DbConfig};
pub use storefront::Storefront;

// Repository re-exports for convenience
pub use repository::audit_log::AuditLogRepository;
pub use repository::inbound::StockInboundRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Defaults to debug for the storefront crates and warn for sqlx. Safe to
/// call twice; the second call is ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront_db=debug,storefront_core=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
