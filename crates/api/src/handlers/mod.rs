pub mod activity;
pub mod auth;
pub mod notification;
pub mod referral;
pub mod webhook;

use serde::Deserialize;
use validator::Validate;

/// `?limit=&cursor=` for cursor-paged listings.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CursorParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}
