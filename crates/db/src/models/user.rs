//! User accounts. Rows are created by the seed tool or provisioned
//! externally; the API only reads them.

use crm_core::types::{DbId, Scopes, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub code11: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub scopes: Json<Scopes>,
    pub referred_by_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting (or re-provisioning) a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub code11: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub scopes: Scopes,
}
