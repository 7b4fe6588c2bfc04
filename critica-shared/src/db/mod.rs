/// Database utilities
///
/// - `pool`: PostgreSQL connection pool creation and health checks
/// - `migrations`: sqlx migration runner
pub mod migrations;
pub mod pool;
