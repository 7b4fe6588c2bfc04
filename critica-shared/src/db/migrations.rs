/// Database migration runner
///
/// Migrations are stored in the `migrations/` directory at the workspace
/// root. Each migration consists of an "up" file (`{timestamp}_{name}.sql`)
/// and a "down" file (`{timestamp}_{name}.down.sql`).
///
/// # Example
///
/// ```no_run
/// use critica_shared::db::migrations::run_migrations;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```
use sqlx::postgres::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration file is malformed, a migration fails to
/// execute, or the database connection is lost during migration.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}
