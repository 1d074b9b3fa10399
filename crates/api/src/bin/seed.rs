//! Bring a database up to date and load seed data.
//!
//! 1. Apply pending migrations.
//! 2. If `SEED_ADMIN_EMAIL`, `SEED_ADMIN_PASSWORD`, and `SEED_ADMIN_CODE11`
//!    are set, create or reset the bootstrap admin.
//! 3. Apply pending files from `SEEDS_DIR`, tracked in `schema_seeds`.

use anyhow::{bail, Context};
use crm_api::auth::password::{hash_password, validate_password_strength};
use crm_api::config::DatabaseConfig;
use crm_api::telemetry;
use crm_core::roles::ROLE_ADMIN;
use crm_db::migrate::{Runner, SqlFileSet};
use crm_db::models::user::CreateUser;
use crm_db::repositories::UserRepo;
use crm_db::DbPool;

struct BootstrapAdmin {
    email: String,
    password: String,
    code11: String,
}

impl BootstrapAdmin {
    /// All three variables or none.
    fn from_env() -> anyhow::Result<Option<Self>> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        match (
            var("SEED_ADMIN_EMAIL"),
            var("SEED_ADMIN_PASSWORD"),
            var("SEED_ADMIN_CODE11"),
        ) {
            (None, None, None) => Ok(None),
            (Some(email), Some(password), Some(code11)) => {
                if code11.chars().count() != 11 {
                    bail!("SEED_ADMIN_CODE11 must be exactly 11 characters");
                }
                validate_password_strength(&password).map_err(anyhow::Error::msg)?;
                Ok(Some(Self {
                    email,
                    password,
                    code11,
                }))
            }
            _ => bail!(
                "SEED_ADMIN_EMAIL, SEED_ADMIN_PASSWORD and SEED_ADMIN_CODE11 must be set together"
            ),
        }
    }

    async fn apply(self, pool: &DbPool) -> anyhow::Result<()> {
        let password_hash = hash_password(&self.password)
            .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
        let user = UserRepo::upsert_by_email(
            pool,
            &CreateUser {
                code11: self.code11,
                email: self.email,
                password_hash,
                role: ROLE_ADMIN.to_string(),
                permissions: vec![],
                scopes: Default::default(),
            },
        )
        .await
        .context("Failed to upsert bootstrap admin")?;
        tracing::info!(user_id = user.id, email = %user.email, "Bootstrap admin ready");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("crm_seed=info,crm_db=info")?;

    let db = DatabaseConfig::from_env()?;
    let admin = BootstrapAdmin::from_env()?;
    let pool = crm_db::create_pool(&db.pool_settings())
        .await
        .context("Failed to connect to database")?;

    let result = seed(&pool, &db, admin).await;
    pool.close().await;
    result
}

async fn seed(pool: &DbPool, db: &DatabaseConfig, admin: Option<BootstrapAdmin>) -> anyhow::Result<()> {
    let migrations = SqlFileSet::from_dir(&db.migrations_dir)?;
    Runner::migrations().run(pool, &migrations).await?;

    match admin {
        Some(admin) => admin.apply(pool).await?,
        None => tracing::info!("SEED_ADMIN_* not set, skipping bootstrap admin"),
    }

    let seeds = SqlFileSet::from_dir(&db.seeds_dir)?;
    let report = Runner::seeds().run(pool, &seeds).await?;
    tracing::info!(
        applied = report.applied.len(),
        skipped = report.skipped,
        "Seeding complete"
    );
    Ok(())
}
