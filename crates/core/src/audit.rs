//! Audit trail vocabulary: action names, entity names, and snapshot redaction.
//!
//! Actions are dot-separated `<entity>.<verb>` strings stored verbatim in
//! `audit_log.action`.

use serde_json::{Map, Value};

/// Known action names for audit log entries.
pub mod actions {
    pub const ACTIVITY_CREATE: &str = "activity.create";
    pub const ACTIVITY_UPDATE: &str = "activity.update";
    pub const ACTIVITY_DELETE: &str = "activity.delete";
    pub const NOTIFICATION_SEND: &str = "notification.send";
    pub const NOTIFICATION_BULK_UPDATE: &str = "notification.bulk_update";
    pub const NOTIFICATION_READ_ALL: &str = "notification.read_all";
    pub const REFERRAL_CREATE: &str = "referral.create";
    pub const WEBHOOK_CREATE: &str = "webhook.create";
    pub const WEBHOOK_DELETE: &str = "webhook.delete";
    pub const AUTH_LOGIN: &str = "auth.login";
}

/// Entity names stored in `audit_log.entity`.
pub mod entities {
    pub const ACTIVITY: &str = "activity";
    pub const NOTIFICATION: &str = "notification";
    pub const REFERRAL: &str = "referral";
    pub const WEBHOOK: &str = "webhook";
    pub const USER: &str = "user";
}

/// Keys whose values never reach the audit table.
pub const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "password_hash",
    "secret",
    "token",
    "authorization",
];

/// Suffixes that mark a compound key (`refresh_token`, `client_secret`) as sensitive.
const SENSITIVE_SUFFIXES: &[&str] = &["_password", "_secret", "_token"];

const REDACTED: &str = "[REDACTED]";

fn is_sensitive(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lower.as_str())
        || SENSITIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Recursively mask sensitive keys in a before/after snapshot.
///
/// Keys match [`SENSITIVE_KEYS`] exactly or end in `_password`, `_secret` or
/// `_token`. Flags such as `has_secret` are kept as they are. `null` values are
/// left alone so "no secret set" stays visible.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                let masked = !val.is_null() && is_sensitive(key);
                let replacement = if masked {
                    Value::String(REDACTED.to_string())
                } else {
                    redact(val)
                };
                out.insert(key.clone(), replacement);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}
