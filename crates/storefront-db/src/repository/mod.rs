//! # Repository Module
//!
//! Pool-backed repositories for reads and single-statement writes.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where Each Write Goes                                │
//! │                                                                         │
//! │  Coordinator ──► LedgerTx (one transaction, many rows)                 │
//! │    orders, order items, stock deltas, inbound + cost                   │
//! │                                                                         │
//! │  Storefront / back office ──► Repository (one statement)               │
//! │    catalog insert, active flag, restock, audit append                  │
//! │                                                                         │
//! │  Reads ──► Repository, any pooled connection                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads, insert, restock
//! - [`OrderRepository`](order::OrderRepository) - Orders and items
//! - [`StockInboundRepository`](inbound::StockInboundRepository) - Received batches
//! - [`AuditLogRepository`](audit_log::AuditLogRepository) - Audit trail

pub mod audit_log;
pub mod inbound;
pub mod order;
pub mod product;
