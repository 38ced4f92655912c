//! # storefront-core: Pure Business Logic for the Storefront Ledger
//!
//! This crate holds every rule of the order and inventory ledger as pure
//! functions. Nothing in here touches a database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Ledger Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Storefront checkout / Admin back office (callers)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │     storefront-db: coordinators + atomic units + audit          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ storefront-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  stock  │ │  cost   │ │ status  │ │  audit  │  │   │
//! │  │   │ Product │ │ engine  │ │ WAC     │ │ machine │ │ entries │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, OrderItem, StockInboundRecord)
//! - [`money`] - Integer money type (whole currency units, no floats)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`stock`] - Stock Invariant Engine
//! - [`pricing`] - Order line pricing and totals
//! - [`cost`] - Cost Basis Calculator (weighted-average cost)
//! - [`status`] - Order status state machine and stock commit point
//! - [`audit`] - Audit entry taxonomy and builders
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::cost::{weighted_average_cost, UnitCost};
//! use storefront_core::money::Money;
//!
//! // 10 units at 100 plus 10 units at 200 average out at 150
//! let avg = weighted_average_cost(10, UnitCost::from_units(100), 10, Money::from_units(200)).unwrap();
//! assert_eq!(avg, UnitCost::from_units(150));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod cost;
pub mod error;
pub mod money;
pub mod pricing;
pub mod status;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use cost::UnitCost;
pub use money::Money;
pub use status::{StockCommitPoint, StockEffect};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines allowed in a single order.
///
/// ## Business Reason
/// Keeps one checkout inside a reasonably sized transaction.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single product on one order line.
///
/// ## Business Reason
/// Catches accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default minimum length of a customer phone number.
pub const DEFAULT_MIN_PHONE_LENGTH: usize = 10;

/// Actor recorded on audit entries written by back-office operations.
pub const DEFAULT_AUDIT_ACTOR: &str = "Admin";

/// Actor recorded on audit entries the system writes on its own behalf.
pub const SYSTEM_ACTOR: &str = "System";
