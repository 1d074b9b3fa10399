//! Keyset ("cursor") pagination.
//!
//! A cursor is an opaque, URL-safe token encoding the sort key and id of the
//! last row a client has seen. Listing queries order by `(sort_key DESC, id
//! DESC)` and resume strictly after the decoded position, so pages stay stable
//! while new rows are inserted at the head.
//!
//! Repositories fetch `limit + 1` rows; [`Page::from_rows`] uses the extra row
//! only to decide whether a `next_cursor` is issued.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Page size used when the client does not ask for one.
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page size a client may request.
pub const MAX_LIMIT: i64 = 100;

/// Clamp a user-provided limit to `1..=max`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Decoded position of the last row on the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "t")]
    pub sort_key: Timestamp,
    pub id: DbId,
}

impl Cursor {
    pub fn new(sort_key: Timestamp, id: DbId) -> Self {
        Self { sort_key, id }
    }

    /// Encode as an opaque base64url token.
    pub fn encode(&self) -> String {
        // Serializing two plain fields cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token produced by [`Cursor::encode`].
    pub fn decode(token: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::Validation("invalid cursor".into());
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| invalid())?;
        serde_json::from_slice(&bytes).map_err(|_| invalid())
    }
}

/// Rows that can be paged by keyset.
pub trait Keyset {
    fn cursor(&self) -> Cursor;
}

/// Validated paging parameters handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub after: Option<Cursor>,
}

impl PageRequest {
    /// Build from raw query values: clamps `limit` and decodes `cursor`.
    ///
    /// An empty cursor string is treated as "first page".
    pub fn parse(limit: Option<i64>, cursor: Option<&str>) -> Result<Self, CoreError> {
        let after = match cursor.map(str::trim).filter(|c| !c.is_empty()) {
            Some(token) => Some(Cursor::decode(token)?),
            None => None,
        };
        Ok(Self {
            limit: clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT),
            after,
        })
    }

    /// Number of rows a repository should fetch (one extra to detect more).
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }

    pub fn after_sort_key(&self) -> Option<Timestamp> {
        self.after.map(|c| c.sort_key)
    }

    pub fn after_id(&self) -> Option<DbId> {
        self.after.map(|c| c.id)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            after: None,
        }
    }
}

/// One page of results plus the token for the next one, if any.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T: Keyset> Page<T> {
    /// Trim a `limit + 1` fetch down to `limit` rows and derive `next_cursor`.
    pub fn from_rows(mut rows: Vec<T>, request: &PageRequest) -> Self {
        let limit = usize::try_from(request.limit).unwrap_or(0);
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(|row| row.cursor().encode())
        } else {
            None
        };
        Self {
            data: rows,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    struct Row(DbId);

    impl Keyset for Row {
        fn cursor(&self) -> Cursor {
            Cursor::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap(), self.0)
        }
    }

    fn rows(n: i64) -> Vec<Row> {
        (1..=n).rev().map(Row).collect()
    }

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(PageRequest::parse(None, None).unwrap().limit, 20);
        assert_eq!(PageRequest::parse(Some(500), None).unwrap().limit, 100);
        assert_eq!(PageRequest::parse(Some(0), None).unwrap().limit, 1);
        assert_eq!(PageRequest::parse(Some(-3), None).unwrap().limit, 1);
        assert_eq!(PageRequest::parse(Some(35), None).unwrap().limit, 35);
    }

    #[test]
    fn cursor_token_is_url_safe_and_decodes() {
        let cursor = Cursor::new(Utc.timestamp_opt(1_700_000_123, 456_000).unwrap(), 99);
        let token = cursor.encode();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn garbage_cursor_is_a_validation_error() {
        let err = PageRequest::parse(None, Some("not a cursor!")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg == "invalid cursor"));

        // Valid base64, wrong payload.
        let token = URL_SAFE_NO_PAD.encode(b"{\"x\":1}");
        assert!(Cursor::decode(&token).is_err());
    }

    #[test]
    fn blank_cursor_means_first_page() {
        let req = PageRequest::parse(Some(10), Some("  ")).unwrap();
        assert_eq!(req.after, None);
    }

    #[test]
    fn full_fetch_yields_next_cursor_from_last_kept_row() {
        let req = PageRequest::parse(Some(3), None).unwrap();
        let page = Page::from_rows(rows(req.fetch_limit()), &req);
        assert_eq!(page.data.len(), 3);
        let next = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn short_fetch_has_no_next_cursor() {
        let req = PageRequest::parse(Some(3), None).unwrap();
        let page = Page::from_rows(rows(2), &req);
        assert_eq!(page.data.len(), 2);
        assert!(page.next_cursor.is_none());
    }
}
