//! Repository for the `webhooks` table.

use crm_core::pagination::PageRequest;
use crm_core::types::DbId;
use sqlx::PgPool;

use crate::models::webhook::{CreateWebhook, Webhook};

const COLUMNS: &str = "\
    id, name, url, event, secret, (secret IS NOT NULL) AS has_secret, \
    created_by, created_at";

/// Provides create/read/delete operations for webhooks. There is no update.
pub struct WebhookRepo;

impl WebhookRepo {
    /// Create a new webhook.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateWebhook,
    ) -> Result<Webhook, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhooks (name, url, event, secret, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(input.name.trim())
            .bind(input.url.trim())
            .bind(input.event.trim())
            .bind(input.secret.as_deref())
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// List webhooks newest-first.
    pub async fn list(
        pool: &PgPool,
        owner: Option<DbId>,
        page: &PageRequest,
    ) -> Result<Vec<Webhook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM webhooks \
             WHERE ($1::BIGINT IS NULL OR created_by = $1) \
               AND ($2::TIMESTAMPTZ IS NULL OR (created_at, id) < ($2, $3)) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(owner)
            .bind(page.after_sort_key())
            .bind(page.after_id())
            .bind(page.fetch_limit())
            .fetch_all(pool)
            .await
    }

    /// Find a webhook by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
    ) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM webhooks \
             WHERE id = $1 AND ($2::BIGINT IS NULL OR created_by = $2)"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    /// Delete a webhook, returning the removed row.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
    ) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!(
            "DELETE FROM webhooks \
             WHERE id = $1 AND ($2::BIGINT IS NULL OR created_by = $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }
}
