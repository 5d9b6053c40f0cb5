// Diesel migration runner
// Uses embedded migrations; the MigrationHarness is sync, so migrations run
// on a blocking thread over diesel-async's AsyncConnectionWrapper.

use crate::db::MIGRATIONS;
use diesel::Connection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::AsyncPgConnection;
use diesel_migrations::MigrationHarness;
use std::error::Error;
use tracing::{debug, info};

/// Whether embedded migrations should run at startup
pub fn should_run_migrations() -> bool {
    std::env::var("DISABLE_EMBEDDED_MIGRATIONS")
        .map(|v| v != "true" && v != "1")
        .unwrap_or(true)
}

/// Run all pending migrations.
/// Returns the number of migrations applied.
pub async fn run_migrations(database_url: &str) -> Result<usize, Box<dyn Error + Send + Sync>> {
    info!("Starting migration process...");

    let database_url = database_url.to_string();

    let applied_count =
        tokio::task::spawn_blocking(move || -> Result<usize, Box<dyn Error + Send + Sync>> {
            debug!("Establishing connection for migrations...");

            let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)
                .map_err(|e| format!("Failed to establish migration connection: {}", e))?;

            let pending = conn
                .pending_migrations(MIGRATIONS)
                .map_err(|e| format!("Failed to check pending migrations: {}", e))?;

            if pending.is_empty() {
                debug!("No pending migrations found");
                return Ok(0);
            }

            info!("Found {} pending migrations", pending.len());

            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| format!("Failed to run migrations: {}", e))?;

            for migration in &applied {
                debug!("Applied migration: {}", migration);
            }

            Ok(applied.len())
        })
        .await
        .map_err(|e| format!("Migration task panicked: {}", e))??;

    info!("Applied {} migrations", applied_count);
    Ok(applied_count)
}
