//! Database pool construction and startup migrations.

use std::time::Duration;

use error_stack::ResultExt;
use masking::PeekInterface;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    configs::settings::Settings,
    core::errors::{ApplicationError, ApplicationResult},
};

pub async fn pg_pool(settings: &Settings) -> ApplicationResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .connect(settings.database.url.peek())
        .await
        .change_context(ApplicationError::DatabaseConnectionError)
}

pub async fn run_migrations(pool: &PgPool) -> ApplicationResult<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .change_context(ApplicationError::MigrationError)
}
