//! # Audit Log Repository
//!
//! Append-only storage for audit entries. JSON snapshots are stored as text.
//!
//! This is the production [`AuditSink`]: the emitter's writer task calls
//! [`insert`](AuditLogRepository::insert) for every queued entry.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::audit::{AuditError, AuditSink};
use crate::error::DbResult;
use storefront_core::audit::{AuditLogEntry, NewAuditEntry};

/// Repository for the audit trail.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct AuditLogRow {
    id: String,
    event_type: String,
    entity_type: String,
    entity_id: Option<String>,
    actor: String,
    action: String,
    description: String,
    old_values: Option<String>,
    new_values: Option<String>,
    metadata: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        AuditLogEntry {
            id: row.id,
            event_type: row.event_type,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            actor: row.actor,
            action: row.action,
            description: row.description,
            old_values: parse_json(row.old_values),
            new_values: parse_json(row.new_values),
            metadata: parse_json(row.metadata),
            created_at: row.created_at,
        }
    }
}

fn parse_json(raw: Option<String>) -> Option<Value> {
    raw.and_then(|text| serde_json::from_str(&text).ok())
}

fn encode_json(value: &Option<Value>) -> Result<Option<String>, serde_json::Error> {
    value.as_ref().map(serde_json::to_string).transpose()
}

impl AuditLogRepository {
    /// Creates a new AuditLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    /// Appends an entry.
    pub async fn insert(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AuditError> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, event_type = %entry.event_type, "Inserting audit entry");

        let row = sqlx::query_as::<_, AuditLogRow>(
            r#"
            INSERT INTO audit_logs (
                id, event_type, entity_type, entity_id, actor, action,
                description, old_values, new_values, metadata, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&entry.event_type)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.actor)
        .bind(&entry.action)
        .bind(&entry.description)
        .bind(encode_json(&entry.old_values)?)
        .bind(encode_json(&entry.new_values)?)
        .bind(encode_json(&entry.metadata)?)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(row.into())
    }

    /// Newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    /// Every entry about one entity, oldest first.
    pub async fn list_for_entity(&self, entity_type: &str, entity_id: &str) -> DbResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT * FROM audit_logs
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY created_at, rowid
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    /// Every entry with this event type, oldest first.
    pub async fn list_by_event_type(&self, event_type: &str) -> DbResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            "SELECT * FROM audit_logs WHERE event_type = ?1 ORDER BY created_at, rowid",
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }
}

impl AuditSink for AuditLogRepository {
    async fn write(&self, entry: &NewAuditEntry) -> Result<(), AuditError> {
        self.insert(entry).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use storefront_core::OrderStatus;

    #[tokio::test]
    async fn test_insert_round_trips_json() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.audit_logs();

        let entry = NewAuditEntry::order_status_changed(
            "4f1c2a9e-0000-4000-8000-000000000000",
            "Lan",
            OrderStatus::Pending,
            OrderStatus::Processing,
        );
        let stored = repo.insert(&entry).await.unwrap();

        assert_eq!(stored.event_type, "order.status_changed");
        assert_eq!(stored.old_values, entry.old_values);
        assert_eq!(stored.new_values.unwrap()["status"], "processing");
        assert!(stored.metadata.is_none());
    }

    #[tokio::test]
    async fn test_list_for_entity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.audit_logs();

        repo.insert(&NewAuditEntry::stock_restored("o-1", 2)).await.unwrap();
        repo.insert(&NewAuditEntry::stock_deducted("o-2", 1)).await.unwrap();
        repo.insert(&NewAuditEntry::stock_restored("o-1", 1)).await.unwrap();

        let for_o1 = repo.list_for_entity("system", "o-1").await.unwrap();
        assert_eq!(for_o1.len(), 2);
        assert!(for_o1.iter().all(|e| e.entity_id.as_deref() == Some("o-1")));

        assert_eq!(repo.list_recent(2).await.unwrap().len(), 2);
        assert_eq!(repo.list_by_event_type("system.event").await.unwrap().len(), 3);
    }
}
