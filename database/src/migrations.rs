use diesel::migration::MigrationSource;
use diesel::pg::Pg;
use diesel_async::AsyncMigrationHarness;
use diesel_migrations::EmbeddedMigrations;
use diesel_migrations::MigrationHarness as _;
use url::Url;

use crate::db_connection_pool::DatabasePoolBuildError;
use crate::db_connection_pool::DatabasePoolError;
use crate::db_connection_pool::create_connection_pool;

/// The SQL migrations of the `migrations/` directory, embedded at compile time
pub const MIGRATIONS: EmbeddedMigrations = diesel_migrations::embed_migrations!();

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    PoolBuild(#[from] DatabasePoolBuildError),
    #[error(transparent)]
    Pool(#[from] DatabasePoolError),
    #[error("failed to apply migrations: {0}")]
    Apply(Box<dyn std::error::Error + Send + Sync>),
}

/// Applies every migration not yet recorded in the target database
///
/// Returns the versions of the applied migrations, oldest first.
#[tracing::instrument(skip_all, err)]
pub async fn run_pending_migrations(url: Url) -> Result<Vec<String>, MigrationError> {
    let pool = create_connection_pool(url, 1)?;
    let conn = pool.get().await.map_err(DatabasePoolError::from)?;
    let mut harness = AsyncMigrationHarness::new(conn);
    let applied = harness
        .run_pending_migrations(MIGRATIONS)
        .map_err(MigrationError::Apply)?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

/// Number of migrations embedded in this binary
pub fn embedded_migration_count() -> usize {
    MigrationSource::<Pg>::migrations(&MIGRATIONS)
        .map(|migrations| migrations.len())
        .unwrap_or_default()
}
