//! Repository for the append-only `audit_log` table.

use crm_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::audit::CreateAuditLog;

/// Write access to the audit trail.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry, returning its id.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO audit_log \
                 (actor_id, action, entity, entity_id, before_state, after_state, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity)
        .bind(entry.entity_id)
        .bind(entry.before_state.as_ref().map(Json))
        .bind(entry.after_state.as_ref().map(Json))
        .bind(Json(&entry.metadata))
        .fetch_one(pool)
        .await
    }
}
