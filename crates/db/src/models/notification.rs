//! Notification entity models and DTOs.

use crm_core::pagination::{Cursor, Keyset};
use crm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_blank;

/// Upper bound on ids accepted by one bulk read-state update.
pub const MAX_BULK_IDS: u64 = 500;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Keyset for Notification {
    fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}

/// DTO for sending an in-app notification to a user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNotification {
    pub user_id: DbId,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub body: Option<String>,
    #[validate(length(max = 2048))]
    pub link: Option<String>,
}

/// DTO for `PATCH /notifications`: set the read state of many at once.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkReadUpdate {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<DbId>,
    /// `true` marks read, `false` marks unread.
    pub read: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bulk_update_requires_ids() {
        let input: BulkReadUpdate =
            serde_json::from_value(json!({ "ids": [], "read": true })).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn bulk_update_caps_id_count() {
        let ids: Vec<DbId> = (1..=(MAX_BULK_IDS as DbId + 1)).collect();
        let input = BulkReadUpdate { ids, read: false };
        assert!(input.validate().is_err());
    }
}
