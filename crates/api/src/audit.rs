//! Best-effort audit trail.
//!
//! [`AuditService::record`] hands the insert to its own task and returns
//! immediately. A failed insert is logged and dropped; it never changes the
//! outcome of the request that produced it.

use crm_core::audit::redact;
use crm_db::models::audit::CreateAuditLog;
use crm_db::repositories::AuditLogRepo;
use crm_db::DbPool;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct AuditService {
    pool: DbPool,
}

impl AuditService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Write `entry` in the background. Snapshots are redacted first.
    ///
    /// Handlers drop the handle; tests may await it.
    pub fn record(&self, mut entry: CreateAuditLog) -> JoinHandle<()> {
        entry.before_state = entry.before_state.as_ref().map(redact);
        entry.after_state = entry.after_state.as_ref().map(redact);

        let pool = self.pool.clone();
        tokio::spawn(async move {
            match AuditLogRepo::insert(&pool, &entry).await {
                Ok(id) => tracing::debug!(
                    audit_id = id,
                    action = entry.action,
                    entity_id = entry.entity_id,
                    "Audit entry written",
                ),
                Err(e) => tracing::warn!(
                    action = entry.action,
                    entity = entry.entity,
                    entity_id = entry.entity_id,
                    error = %e,
                    "Failed to write audit entry",
                ),
            }
        })
    }
}

/// Serialize a record for a before/after snapshot.
pub fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
