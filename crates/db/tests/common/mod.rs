#![allow(dead_code)]

use crm_db::migrate::{Runner, SqlFileSet};
use crm_db::models::user::CreateUser;
use crm_db::models::user::User;
use crm_db::repositories::UserRepo;
use sqlx::PgPool;

/// The workspace's real migration directory.
pub fn migration_files() -> SqlFileSet {
    SqlFileSet::from_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/../../db/migrations"))
        .expect("migrations directory should be readable")
}

/// The workspace's seed directory.
pub fn seed_files() -> SqlFileSet {
    SqlFileSet::from_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/../../db/seeds"))
        .expect("seeds directory should be readable")
}

/// Apply all migrations to a fresh test database.
pub async fn migrate(pool: &PgPool) {
    Runner::migrations()
        .run(pool, &migration_files())
        .await
        .expect("migrations should apply");
}

/// Insert a user with a dummy password hash.
pub async fn create_user(pool: &PgPool, email: &str, code11: &str, role: &str) -> User {
    let input = CreateUser {
        code11: code11.to_string(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role: role.to_string(),
        permissions: vec![],
        scopes: Default::default(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// `true` if a relation with this name exists.
pub async fn table_exists(pool: &PgPool, name: &str) -> bool {
    sqlx::query_scalar(&format!("SELECT to_regclass('{name}') IS NOT NULL"))
        .fetch_one(pool)
        .await
        .unwrap()
}
