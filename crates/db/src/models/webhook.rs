//! Webhook subscription models and DTOs.
//!
//! Webhooks can be created and deleted but not edited.

use crm_core::pagination::{Cursor, Keyset};
use crm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::validate_not_blank;

/// A row from the `webhooks` table.
///
/// The signing secret is never serialized; clients see `has_secret` instead.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Webhook {
    pub id: DbId,
    pub name: String,
    pub url: String,
    pub event: String,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub has_secret: bool,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

impl Keyset for Webhook {
    fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}

/// DTO for `POST /webhooks`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWebhook {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(max = 2048), url, custom(function = "validate_http_url"))]
    pub url: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub event: String,
    #[validate(length(min = 8, max = 255))]
    pub secret: Option<String>,
}

/// Deliveries are plain HTTP(S) POSTs, so other schemes are refused.
fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        Ok(())
    } else {
        let mut err = ValidationError::new("http_url");
        err.message = Some("must be an http or https URL".into());
        Err(err)
    }
}
