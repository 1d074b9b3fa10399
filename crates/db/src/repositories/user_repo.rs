//! Repository for the `users` table.

use crm_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, code11, email, password_hash, role, permissions, scopes, \
                       referred_by_id, is_active, created_at, updated_at";

/// Provides lookups and provisioning for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (code11, email, password_hash, role, permissions, scopes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.code11)
            .bind(input.email.to_lowercase())
            .bind(&input.password_hash)
            .bind(&input.role)
            .bind(&input.permissions)
            .bind(Json(&input.scopes))
            .fetch_one(pool)
            .await
    }

    /// Insert a user, or overwrite credentials, role, and grants of the
    /// existing user with the same email.
    pub async fn upsert_by_email(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (code11, email, password_hash, role, permissions, scopes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT ON CONSTRAINT uq_users_email DO UPDATE SET \
                 password_hash = EXCLUDED.password_hash, \
                 role = EXCLUDED.role, \
                 permissions = EXCLUDED.permissions, \
                 scopes = EXCLUDED.scopes, \
                 is_active = true, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.code11)
            .bind(input.email.to_lowercase())
            .bind(&input.password_hash)
            .bind(&input.role)
            .bind(&input.permissions)
            .bind(Json(&input.scopes))
            .fetch_one(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive; emails are stored lowercase).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await
    }
}
