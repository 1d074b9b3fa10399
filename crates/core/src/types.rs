/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque data-scope grants carried on a user and in their tokens
/// (e.g. `{"client": "acme", "tier": 2}`). Values may be any JSON; the backend
/// stores and forwards them verbatim.
pub type Scopes = std::collections::BTreeMap<String, serde_json::Value>;
