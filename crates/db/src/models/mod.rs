//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - Where the resource can change, an update DTO of `Option` fields

pub mod activity;
pub mod audit;
pub mod notification;
pub mod referral;
pub mod user;
pub mod webhook;

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Deserialize a nullable patch field so that an explicit `null` becomes
/// `Some(None)` while an absent key (via `#[serde(default)]`) stays `None`.
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Reject strings that are empty once surrounding whitespace is removed.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
        assert!(validate_not_blank(" ok ").is_ok());
    }
}
