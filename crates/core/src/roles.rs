//! User roles and well-known permission names.
//!
//! Role names must match the `CHECK` constraint on `users.role` in
//! `db/migrations/0001_create_users.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_RESELLER: &str = "reseller";
pub const ROLE_CUSTOMER: &str = "customer";

/// The four account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Seller,
    Reseller,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Seller => ROLE_SELLER,
            Role::Reseller => ROLE_RESELLER,
            Role::Customer => ROLE_CUSTOMER,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored or claimed role name is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_SELLER => Ok(Role::Seller),
            ROLE_RESELLER => Ok(Role::Reseller),
            ROLE_CUSTOMER => Ok(Role::Customer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Permission strings carried in the `permissions` claim.
pub mod permissions {
    pub const NOTIFICATIONS_SEND: &str = "notifications:send";
    pub const REFERRALS_STATS_ALL: &str = "referrals:stats:all";
}
