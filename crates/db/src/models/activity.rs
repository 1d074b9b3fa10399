//! Activity entity models and DTOs.
//!
//! An activity is a timeline entry (email, call, meeting, note, or a system
//! event) owned by the user who logged it and optionally linked to a
//! company, contact, or opportunity.

use crm_core::pagination::{Cursor, Keyset};
use crm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

use super::{explicit_null, validate_not_blank};

/// Maps to the Postgres enum `activity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "activity_type", rename_all = "lowercase")]
pub enum ActivityType {
    Email,
    Call,
    Meeting,
    Note,
    System,
}

/// Direction of a call or email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Structured extras stored in `activities.metadata`.
///
/// Unknown keys are rejected so the column never accumulates free-form data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ActivityMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,

    /// Length of a call or meeting. At most one day.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 1440))]
    pub duration_minutes: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[validate(length(max = 50))]
    pub attendees: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub outcome: Option<String>,
}

/// A row from the `activities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Activity {
    pub id: DbId,
    pub owner_id: DbId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub company_id: Option<DbId>,
    pub contact_id: Option<DbId>,
    pub opportunity_id: Option<DbId>,
    pub content: String,
    pub metadata: Json<ActivityMetadata>,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Keyset for Activity {
    fn cursor(&self) -> Cursor {
        Cursor::new(self.occurred_at, self.id)
    }
}

/// DTO for `POST /activities`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub company_id: Option<DbId>,
    pub contact_id: Option<DbId>,
    pub opportunity_id: Option<DbId>,
    #[validate(length(min = 1, max = 10000), custom(function = "validate_not_blank"))]
    pub content: String,
    #[serde(default)]
    #[validate(nested)]
    pub metadata: ActivityMetadata,
    /// Defaults to the insert time.
    pub occurred_at: Option<Timestamp>,
}

/// DTO for `PATCH /activities/{id}`. Absent fields are left unchanged.
///
/// The three link ids distinguish an absent key (`None`) from an explicit
/// `null` (`Some(None)`), which unlinks the activity.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateActivity {
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub company_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub contact_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub opportunity_id: Option<Option<DbId>>,
    #[validate(length(min = 1, max = 10000), custom(function = "validate_not_blank"))]
    pub content: Option<String>,
    /// Replaces the stored metadata as a whole.
    #[validate(nested)]
    pub metadata: Option<ActivityMetadata>,
    pub occurred_at: Option<Timestamp>,
}

impl UpdateActivity {
    /// `true` when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.activity_type.is_none()
            && self.company_id.is_none()
            && self.contact_id.is_none()
            && self.opportunity_id.is_none()
            && self.content.is_none()
            && self.metadata.is_none()
            && self.occurred_at.is_none()
    }
}

/// Optional filters for `GET /activities`.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub activity_type: Option<ActivityType>,
    pub company_id: Option<DbId>,
    pub contact_id: Option<DbId>,
    pub opportunity_id: Option<DbId>,
}
