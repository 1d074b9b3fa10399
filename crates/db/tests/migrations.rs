//! Tests for the ordered SQL file runner against a real database.

mod common;

use assert_matches::assert_matches;
use crm_db::migrate::{MigrateError, Runner, SqlFile, SqlFileSet};
use sqlx::PgPool;

#[sqlx::test(migrations = false)]
async fn applies_all_migrations_in_order(pool: PgPool) {
    let files = common::migration_files();
    let report = Runner::migrations().run(&pool, &files).await.unwrap();

    let expected: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    assert_eq!(report.applied, expected);
    assert_eq!(report.skipped, 0);

    for table in ["users", "activities", "notifications", "referrals", "webhooks", "audit_log"] {
        assert!(common::table_exists(&pool, table).await, "{table} should exist");
    }
}

#[sqlx::test(migrations = false)]
async fn second_run_executes_nothing(pool: PgPool) {
    let files = common::migration_files();
    let runner = Runner::migrations();

    runner.run(&pool, &files).await.unwrap();
    let second = runner.run(&pool, &files).await.unwrap();

    assert!(second.applied.is_empty(), "nothing should be re-applied");
    assert_eq!(second.skipped, files.len());

    let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(recorded, files.len() as i64);
}

#[sqlx::test(migrations = false)]
async fn failing_file_rolls_back_and_stops_the_run(pool: PgPool) {
    let broken = SqlFileSet::from_files(vec![
        SqlFile::new("0001_ok.sql", "CREATE TABLE t_ok (id INT);"),
        SqlFile::new(
            "0002_bad.sql",
            "CREATE TABLE t_bad (id INT); SELECT * FROM table_that_does_not_exist;",
        ),
        SqlFile::new("0003_after.sql", "CREATE TABLE t_after (id INT);"),
    ]);

    let err = Runner::migrations().run(&pool, &broken).await.unwrap_err();
    assert_matches!(err, MigrateError::Failed { ref name, .. } if name == "0002_bad.sql");

    assert!(common::table_exists(&pool, "t_ok").await);
    assert!(!common::table_exists(&pool, "t_bad").await, "failed file must roll back");
    assert!(!common::table_exists(&pool, "t_after").await, "later files must not run");

    let applied = Runner::migrations().applied_names(&pool).await.unwrap();
    assert_eq!(applied.len(), 1);
    assert!(applied.contains("0001_ok.sql"));

    // Fixing the file lets the next run resume from it.
    let fixed = SqlFileSet::from_files(vec![
        SqlFile::new("0001_ok.sql", "CREATE TABLE t_ok (id INT);"),
        SqlFile::new("0002_bad.sql", "CREATE TABLE t_bad (id INT);"),
        SqlFile::new("0003_after.sql", "CREATE TABLE t_after (id INT);"),
    ]);
    let report = Runner::migrations().run(&pool, &fixed).await.unwrap();
    assert_eq!(report.applied, ["0002_bad.sql", "0003_after.sql"]);
    assert_eq!(report.skipped, 1);
}

#[sqlx::test(migrations = false)]
async fn seeds_are_tracked_separately(pool: PgPool) {
    common::migrate(&pool).await;
    common::create_user(&pool, "admin@crm.test", "00000000001", "admin").await;

    let seeds = common::seed_files();
    let first = Runner::seeds().run(&pool, &seeds).await.unwrap();
    assert_eq!(first.applied.len(), seeds.len());

    let second = Runner::seeds().run(&pool, &seeds).await.unwrap();
    assert!(second.applied.is_empty());

    let welcome: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM referrals WHERE code = 'WELCOME'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(welcome, 1);

    // The migration tracking table is untouched by seeds.
    let migrations = Runner::migrations().applied_names(&pool).await.unwrap();
    assert_eq!(migrations.len(), common::migration_files().len());
}
