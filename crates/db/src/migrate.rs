//! Ordered SQL file runner used for both schema migrations and seed data.
//!
//! Each file is applied at most once per database. Applied names are recorded
//! in a tracking table (`schema_migrations` or `schema_seeds`) inside the same
//! transaction as the file's statements, so a file is either fully applied and
//! recorded or not at all. The first failing file aborts the run; files after
//! it are never attempted.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sqlx::{Postgres, Transaction};

use crate::DbPool;

/// Tracking table for schema migrations.
pub const MIGRATIONS_TABLE: &str = "schema_migrations";

/// Tracking table for seed files.
pub const SEEDS_TABLE: &str = "schema_seeds";

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("failed to read SQL directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQL file name is not valid UTF-8: {0}")]
    InvalidName(PathBuf),

    #[error("failed to prepare tracking table {table}: {source}")]
    Tracking {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{name} failed and was rolled back: {source}")]
    Failed {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}

/// One SQL file: its unique name and full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFile {
    pub name: String,
    pub sql: String,
}

impl SqlFile {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// SQL files in application order (sorted by name).
#[derive(Debug, Clone, Default)]
pub struct SqlFileSet {
    files: Vec<SqlFile>,
}

impl SqlFileSet {
    /// Build a set from in-memory files; they are sorted by name.
    pub fn from_files(mut files: Vec<SqlFile>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Self { files }
    }

    /// Load every `*.sql` file directly inside `dir`.
    ///
    /// Subdirectories and other extensions are ignored.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MigrateError> {
        let dir = dir.as_ref();
        let io_err = |source| MigrateError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| MigrateError::InvalidName(path.clone()))?
                .to_string();
            let sql = std::fs::read_to_string(&path).map_err(|source| MigrateError::Io {
                path: path.clone(),
                source,
            })?;
            files.push(SqlFile { name, sql });
        }

        Ok(Self::from_files(files))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SqlFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Outcome of a [`Runner::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Names applied by this run, in order.
    pub applied: Vec<String>,
    /// Files that were already recorded as applied.
    pub skipped: usize,
}

/// Applies a [`SqlFileSet`], recording progress in a tracking table.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    table: &'static str,
}

impl Runner {
    /// Runner for schema migrations (`schema_migrations`).
    pub fn migrations() -> Self {
        Self {
            table: MIGRATIONS_TABLE,
        }
    }

    /// Runner for seed data (`schema_seeds`).
    pub fn seeds() -> Self {
        Self { table: SEEDS_TABLE }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Apply every file in `files` that has not been applied yet.
    pub async fn run(&self, pool: &DbPool, files: &SqlFileSet) -> Result<RunReport, MigrateError> {
        self.ensure_table(pool).await?;
        let applied = self.applied_names(pool).await?;

        let mut report = RunReport::default();
        for file in files.iter() {
            if applied.contains(&file.name) {
                report.skipped += 1;
                continue;
            }
            if self.apply(pool, file).await? {
                tracing::info!(table = self.table, name = %file.name, "Applied SQL file");
                report.applied.push(file.name.clone());
            } else {
                // Another runner applied it between our read and our lock.
                report.skipped += 1;
            }
        }

        tracing::info!(
            table = self.table,
            applied = report.applied.len(),
            skipped = report.skipped,
            "SQL file run complete",
        );
        Ok(report)
    }

    /// Names already recorded in the tracking table.
    pub async fn applied_names(&self, pool: &DbPool) -> Result<HashSet<String>, MigrateError> {
        let query = format!("SELECT name FROM {} ORDER BY name", self.table);
        let names: Vec<String> = sqlx::query_scalar(&query)
            .fetch_all(pool)
            .await
            .map_err(|source| MigrateError::Tracking {
                table: self.table,
                source,
            })?;
        Ok(names.into_iter().collect())
    }

    async fn ensure_table(&self, pool: &DbPool) -> Result<(), MigrateError> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} ( \
                 name TEXT NOT NULL, \
                 executed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
                 CONSTRAINT uq_{table}_name UNIQUE (name) \
             )",
            table = self.table
        );
        sqlx::query(&ddl)
            .execute(pool)
            .await
            .map_err(|source| MigrateError::Tracking {
                table: self.table,
                source,
            })?;
        Ok(())
    }

    /// Apply one file in its own transaction.
    ///
    /// Returns `false` if the file turned out to be recorded already once the
    /// advisory lock was held.
    async fn apply(&self, pool: &DbPool, file: &SqlFile) -> Result<bool, MigrateError> {
        let failed = |source| MigrateError::Failed {
            name: file.name.clone(),
            source,
        };

        let mut tx = pool.begin().await.map_err(failed)?;

        let outcome = self.apply_in(&mut tx, file).await;
        match outcome {
            Ok(applied) => {
                tx.commit().await.map_err(failed)?;
                Ok(applied)
            }
            Err(source) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        name = %file.name,
                        error = %rollback_err,
                        "Rollback after failed SQL file also failed",
                    );
                }
                tracing::error!(name = %file.name, error = %source, "SQL file failed");
                Err(failed(source))
            }
        }
    }

    async fn apply_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        file: &SqlFile,
    ) -> Result<bool, sqlx::Error> {
        // Serialize concurrent runners on the same tracking table.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::BIGINT)")
            .bind(self.table)
            .execute(&mut **tx)
            .await?;

        let exists_query = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE name = $1)", self.table);
        let exists: bool = sqlx::query_scalar(&exists_query)
            .bind(&file.name)
            .fetch_one(&mut **tx)
            .await?;
        if exists {
            return Ok(false);
        }

        sqlx::raw_sql(&file.sql).execute(&mut **tx).await?;

        let insert = format!("INSERT INTO {} (name) VALUES ($1)", self.table);
        sqlx::query(&insert)
            .bind(&file.name)
            .execute(&mut **tx)
            .await?;
        Ok(true)
    }
}
