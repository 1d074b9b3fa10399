//! Audit log models.
//!
//! Entries are append-only and written best-effort; there is no read path
//! in the API.

use crm_core::types::DbId;
use serde::Serialize;

/// Request context stored alongside an audit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// DTO for inserting one audit log entry.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub actor_id: Option<DbId>,
    pub action: &'static str,
    pub entity: &'static str,
    pub entity_id: Option<DbId>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub metadata: AuditMetadata,
}

impl CreateAuditLog {
    /// Start an entry for `action` on `entity`; everything else is optional.
    pub fn new(action: &'static str, entity: &'static str) -> Self {
        Self {
            actor_id: None,
            action,
            entity,
            entity_id: None,
            before_state: None,
            after_state: None,
            metadata: AuditMetadata::default(),
        }
    }

    pub fn actor(mut self, actor_id: DbId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn entity_id(mut self, entity_id: DbId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn before(mut self, state: serde_json::Value) -> Self {
        self.before_state = Some(state);
        self
    }

    pub fn after(mut self, state: serde_json::Value) -> Self {
        self.after_state = Some(state);
        self
    }

    pub fn correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.metadata.correlation_id = correlation_id;
        self
    }
}
