//! Repository for the `notifications` table.
//!
//! Every read and write is scoped by `user_id`; a user can never see or
//! change another user's notifications through this repository.

use crm_core::pagination::PageRequest;
use crm_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, title, body, link, read_at, created_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a notification for a user.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, title, body, link) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(input.title.trim())
            .bind(input.body.as_deref())
            .bind(input.link.as_deref())
            .fetch_one(pool)
            .await
    }

    /// List a user's notifications newest-first.
    ///
    /// When `unread_only` is `true`, only rows with `read_at IS NULL` are
    /// returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 \
               AND (NOT $2 OR read_at IS NULL) \
               AND ($3::TIMESTAMPTZ IS NULL OR (created_at, id) < ($3, $4)) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $5"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(page.after_sort_key())
            .bind(page.after_id())
            .bind(page.fetch_limit())
            .fetch_all(pool)
            .await
    }

    /// Set the read state of the given notifications in one statement.
    ///
    /// Only rows owned by `user_id` whose state actually changes are touched,
    /// so the returned count can be lower than `ids.len()` when ids are
    /// unknown, belong to someone else, repeat, or are already in the
    /// requested state.
    pub async fn set_read_state(
        pool: &PgPool,
        user_id: DbId,
        ids: &[DbId],
        read: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = CASE WHEN $3 THEN NOW() ELSE NULL END \
             WHERE user_id = $1 \
               AND id = ANY($2) \
               AND (read_at IS NULL) = $3",
        )
        .bind(user_id)
        .bind(ids)
        .bind(read)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = NOW() \
             WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
