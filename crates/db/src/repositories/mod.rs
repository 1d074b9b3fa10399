//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Methods taking an
//! `owner: Option<DbId>` restrict the statement to that owner's rows when
//! `Some`, and act on any row when `None` (admin access).

pub mod activity_repo;
pub mod audit_log_repo;
pub mod notification_repo;
pub mod referral_repo;
pub mod user_repo;
pub mod webhook_repo;

pub use activity_repo::ActivityRepo;
pub use audit_log_repo::AuditLogRepo;
pub use notification_repo::NotificationRepo;
pub use referral_repo::ReferralRepo;
pub use user_repo::UserRepo;
pub use webhook_repo::WebhookRepo;
