//! Referral code models and DTOs.

use crm_core::pagination::{Cursor, Keyset};
use crm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A row from the `referrals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Referral {
    pub id: DbId,
    pub code: String,
    pub owner_user_id: DbId,
    pub created_at: Timestamp,
}

impl Keyset for Referral {
    fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}

/// Per-owner referral count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReferralStats {
    pub owner_user_id: DbId,
    pub count: i64,
}

/// DTO for `POST /referrals`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReferral {
    #[validate(length(min = 4, max = 32), custom(function = "validate_referral_code"))]
    pub code: String,
}

/// Codes are restricted to `[A-Za-z0-9_-]` so they are safe in share links.
fn validate_referral_code(code: &str) -> Result<(), ValidationError> {
    if code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("referral_code");
        err.message = Some("may only contain letters, digits, '-' and '_'".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: &str) -> CreateReferral {
        CreateReferral {
            code: value.to_string(),
        }
    }

    #[test]
    fn accepts_reasonable_codes() {
        assert!(code("SUMMER-24").validate().is_ok());
        assert!(code("ab_c").validate().is_ok());
    }

    #[test]
    fn rejects_short_codes() {
        assert!(code("abc").validate().is_err());
    }

    #[test]
    fn rejects_codes_with_spaces_or_symbols() {
        assert!(code("two words").validate().is_err());
        assert!(code("promo%20").validate().is_err());
    }
}
