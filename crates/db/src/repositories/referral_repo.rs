//! Repository for the `referrals` table.
//!
//! Codes are unique (`uq_referrals_code`); inserting a duplicate surfaces
//! as a unique-violation error and never replaces the existing row.

use crm_core::pagination::PageRequest;
use crm_core::types::DbId;
use sqlx::PgPool;

use crate::models::referral::{Referral, ReferralStats};

/// Column list for `referrals` queries.
const COLUMNS: &str = "id, code, owner_user_id, created_at";

pub struct ReferralRepo;

impl ReferralRepo {
    /// Create a referral code owned by `owner_user_id`.
    pub async fn create(
        pool: &PgPool,
        owner_user_id: DbId,
        code: &str,
    ) -> Result<Referral, sqlx::Error> {
        let query = format!(
            "INSERT INTO referrals (code, owner_user_id) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Referral>(&query)
            .bind(code)
            .bind(owner_user_id)
            .fetch_one(pool)
            .await
    }

    /// List an owner's referral codes newest-first.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_user_id: DbId,
        page: &PageRequest,
    ) -> Result<Vec<Referral>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM referrals \
             WHERE owner_user_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR (created_at, id) < ($2, $3)) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, Referral>(&query)
            .bind(owner_user_id)
            .bind(page.after_sort_key())
            .bind(page.after_id())
            .bind(page.fetch_limit())
            .fetch_all(pool)
            .await
    }

    /// Count referral codes grouped by owner, largest first.
    ///
    /// `owner = Some(id)` restricts the aggregate to that one owner.
    pub async fn stats(
        pool: &PgPool,
        owner: Option<DbId>,
    ) -> Result<Vec<ReferralStats>, sqlx::Error> {
        sqlx::query_as::<_, ReferralStats>(
            "SELECT owner_user_id, COUNT(*) AS count FROM referrals \
             WHERE ($1::BIGINT IS NULL OR owner_user_id = $1) \
             GROUP BY owner_user_id \
             ORDER BY count DESC, owner_user_id ASC",
        )
        .bind(owner)
        .fetch_all(pool)
        .await
    }
}
