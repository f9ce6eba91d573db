//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tw-cli migrate
//! ```
//!
//! Runs the schema migrations embedded from `crates/core/migrations/`, then
//! creates the session tables for both servers (`tower_sessions.session`
//! for the storefront, `tower_sessions.admin_session` for admin). Every
//! step is idempotent.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or `ADMIN_DATABASE_URL` / `STOREFRONT_DATABASE_URL`)

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use tidewear_admin::middleware::session::{SESSION_TABLE_NAME, session_store};
use tidewear_core::db::{MIGRATOR, create_pool};

use super::{database_url, database_url_vars};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store error: {0}")]
    SessionStore(String),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url().ok_or_else(|| MigrationError::MissingEnvVar(database_url_vars()))?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;

    tracing::info!("Running schema migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!(table = SESSION_TABLE_NAME, "Creating admin session table...");
    session_store(&pool)
        .map_err(MigrationError::SessionStore)?
        .migrate()
        .await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
