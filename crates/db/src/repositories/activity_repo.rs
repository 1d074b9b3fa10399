//! Repository for the `activities` table.

use crm_core::pagination::PageRequest;
use crm_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::activity::{Activity, ActivityFilter, CreateActivity, UpdateActivity};

/// Column list for `activities` queries.
const COLUMNS: &str = "id, owner_id, activity_type, company_id, contact_id, opportunity_id, \
                       content, metadata, occurred_at, created_at, updated_at";

/// Provides CRUD operations for activities.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Insert an activity owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateActivity,
    ) -> Result<Activity, sqlx::Error> {
        let query = format!(
            "INSERT INTO activities \
                 (owner_id, activity_type, company_id, contact_id, opportunity_id, \
                  content, metadata, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW())) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(owner_id)
            .bind(input.activity_type)
            .bind(input.company_id)
            .bind(input.contact_id)
            .bind(input.opportunity_id)
            .bind(input.content.trim())
            .bind(Json(&input.metadata))
            .bind(input.occurred_at)
            .fetch_one(pool)
            .await
    }

    /// Find an activity by id, optionally restricted to an owner.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
    ) -> Result<Option<Activity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activities \
             WHERE id = $1 AND ($2::BIGINT IS NULL OR owner_id = $2)"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    /// List activities newest-first, resuming after `page.after`.
    ///
    /// Returns up to `page.fetch_limit()` rows; the caller trims with
    /// `Page::from_rows`.
    pub async fn list(
        pool: &PgPool,
        owner: Option<DbId>,
        filter: &ActivityFilter,
        page: &PageRequest,
    ) -> Result<Vec<Activity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activities \
             WHERE ($1::BIGINT IS NULL OR owner_id = $1) \
               AND ($2::activity_type IS NULL OR activity_type = $2) \
               AND ($3::BIGINT IS NULL OR company_id = $3) \
               AND ($4::BIGINT IS NULL OR contact_id = $4) \
               AND ($5::BIGINT IS NULL OR opportunity_id = $5) \
               AND ($6::TIMESTAMPTZ IS NULL OR (occurred_at, id) < ($6, $7)) \
             ORDER BY occurred_at DESC, id DESC \
             LIMIT $8"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(owner)
            .bind(filter.activity_type)
            .bind(filter.company_id)
            .bind(filter.contact_id)
            .bind(filter.opportunity_id)
            .bind(page.after_sort_key())
            .bind(page.after_id())
            .bind(page.fetch_limit())
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Returns `None` if no matching row exists.
    ///
    /// Link ids are written whenever the patch names them, so an explicit
    /// `null` clears the link.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
        input: &UpdateActivity,
    ) -> Result<Option<Activity>, sqlx::Error> {
        let query = format!(
            "UPDATE activities SET \
                 activity_type = COALESCE($3, activity_type), \
                 company_id = CASE WHEN $4 THEN $5 ELSE company_id END, \
                 contact_id = CASE WHEN $6 THEN $7 ELSE contact_id END, \
                 opportunity_id = CASE WHEN $8 THEN $9 ELSE opportunity_id END, \
                 content = COALESCE($10, content), \
                 metadata = COALESCE($11, metadata), \
                 occurred_at = COALESCE($12, occurred_at), \
                 updated_at = NOW() \
             WHERE id = $1 AND ($2::BIGINT IS NULL OR owner_id = $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(id)
            .bind(owner)
            .bind(input.activity_type)
            .bind(input.company_id.is_some())
            .bind(input.company_id.flatten())
            .bind(input.contact_id.is_some())
            .bind(input.contact_id.flatten())
            .bind(input.opportunity_id.is_some())
            .bind(input.opportunity_id.flatten())
            .bind(input.content.as_deref().map(str::trim))
            .bind(input.metadata.as_ref().map(Json))
            .bind(input.occurred_at)
            .fetch_optional(pool)
            .await
    }

    /// Delete an activity, returning the removed row.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
    ) -> Result<Option<Activity>, sqlx::Error> {
        let query = format!(
            "DELETE FROM activities \
             WHERE id = $1 AND ($2::BIGINT IS NULL OR owner_id = $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }
}
