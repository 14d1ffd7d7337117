/// Schema migrations
///
/// Migrations are embedded at compile time from `migrations/` at the
/// workspace root. Each file is `{timestamp}_{name}.sql`.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applied migration summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of successfully applied migrations
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,
}

impl MigrationStatus {
    /// Whether every embedded migration has been applied
    pub fn is_up_to_date(&self) -> bool {
        self.applied_migrations >= embedded_migration_count()
    }
}

/// Number of migrations compiled into this binary
pub fn embedded_migration_count() -> usize {
    sqlx::migrate!("../migrations").iter().count()
}

/// Runs all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails or was modified after being applied.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations complete");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Reads the applied migrations from `_sqlx_migrations`
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
    })
}

/// Creates the database if it doesn't exist (development and tests)
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_present() {
        assert_eq!(embedded_migration_count(), 2);
    }

    #[test]
    fn test_up_to_date() {
        let status = MigrationStatus {
            applied_migrations: embedded_migration_count(),
            latest_version: Some(20260101000002),
        };
        assert!(status.is_up_to_date());

        let behind = MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        };
        assert!(!behind.is_up_to_date());
    }
}
