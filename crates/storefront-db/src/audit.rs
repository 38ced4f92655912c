//! # Audit Emitter
//!
//! Best-effort, fire-and-forget recorder for the audit trail.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerTx::commit ──► AuditEmitter::record(entry)   (try_send, no wait)│
//! │                              │                                          │
//! │                              ▼                                          │
//! │                 bounded mpsc queue (audit_buffer)                       │
//! │                              │        full? ──► warn!, entry dropped    │
//! │                              ▼                                          │
//! │                 writer task ──► AuditSink::write                        │
//! │                                        │                                │
//! │                                        └─ Err ──► warn!, swallowed      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed or dropped audit write never reaches the caller of a ledger
//! operation and never undoes a committed transaction.

use std::future::Future;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use storefront_core::audit::NewAuditEntry;

use crate::error::DbError;

/// Audit write failure. Logged, never propagated to ledger callers.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit store error: {0}")]
    Store(#[from] DbError),

    #[error("Audit entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit entries.
pub trait AuditSink: Send + Sync + 'static {
    fn write(&self, entry: &NewAuditEntry) -> impl Future<Output = Result<(), AuditError>> + Send;
}

enum AuditCommand {
    Record(NewAuditEntry),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background audit writer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditEmitter {
    sender: mpsc::Sender<AuditCommand>,
}

impl std::fmt::Debug for AuditCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditCommand::Record(entry) => write!(f, "Record({})", entry.event_type),
            AuditCommand::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl AuditEmitter {
    /// Starts the writer task on the current tokio runtime.
    ///
    /// The task ends once every emitter handle has been dropped.
    pub fn spawn<S: AuditSink>(sink: S, buffer: usize) -> Self {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        tokio::spawn(run_writer(sink, receiver));
        debug!(buffer, "Audit writer started");
        AuditEmitter { sender }
    }

    /// Queues an entry. Never blocks and never fails.
    pub fn record(&self, entry: NewAuditEntry) {
        match self.sender.try_send(AuditCommand::Record(entry)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(command)) => {
                warn!(?command, "Audit queue full, entry dropped");
            }
            Err(mpsc::error::TrySendError::Closed(command)) => {
                warn!(?command, "Audit writer stopped, entry dropped");
            }
        }
    }

    /// Waits until every entry queued before this call has been handled.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(AuditCommand::Flush(done)).await.is_err() {
            return;
        }
        let _ = wait.await;
    }
}

async fn run_writer<S: AuditSink>(sink: S, mut receiver: mpsc::Receiver<AuditCommand>) {
    while let Some(command) = receiver.recv().await {
        match command {
            AuditCommand::Record(entry) => {
                trace!(event_type = %entry.event_type, "Writing audit entry");
                if let Err(e) = sink.write(&entry).await {
                    warn!(
                        error = %e,
                        event_type = %entry.event_type,
                        entity_id = ?entry.entity_id,
                        "Audit write failed"
                    );
                }
            }
            AuditCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Audit writer has shut down");
}

// =============================================================================
// Unit Tests
// =============================================================================
