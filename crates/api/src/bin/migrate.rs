//! Apply pending schema migrations and exit.
//!
//! Exits non-zero on the first failing file; that file is rolled back and
//! nothing after it runs.

use anyhow::Context;
use crm_api::config::DatabaseConfig;
use crm_api::telemetry;
use crm_db::migrate::{Runner, SqlFileSet};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("crm_migrate=info,crm_db=info")?;

    let db = DatabaseConfig::from_env()?;
    let pool = crm_db::create_pool(&db.pool_settings())
        .await
        .context("Failed to connect to database")?;

    let files = SqlFileSet::from_dir(&db.migrations_dir)?;
    tracing::info!(dir = %db.migrations_dir.display(), files = files.len(), "Running migrations");
    let result = Runner::migrations().run(&pool, &files).await;
    pool.close().await;

    let report = result?;
    tracing::info!(
        applied = report.applied.len(),
        skipped = report.skipped,
        "Migrations complete"
    );
    Ok(())
}
