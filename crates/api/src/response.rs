//! Shared response envelope types for API handlers.
//!
//! Single resources are wrapped as `{ "data": ... }`. Cursor-paged lists use
//! [`crm_core::pagination::Page`], which serializes as
//! `{ "data": [...], "next_cursor": ... }`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Body of bulk mutation responses.
#[derive(Debug, Serialize)]
pub struct UpdatedCount {
    pub updated: u64,
}
