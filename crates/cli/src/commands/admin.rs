//! Admin account bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Create a new, already verified admin
//! tw-cli admin create -e ops@tidewear.shop -n "Ops" -p 'long random password'
//!
//! # Grant admin to an existing account (its password is kept)
//! tw-cli admin create -e ana@tidewear.shop -n "Ana" -p unused --promote
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or `ADMIN_DATABASE_URL` / `STOREFRONT_DATABASE_URL`)

use thiserror::Error;

use tidewear_admin::services::auth::{AdminAuthError, hash_password, validate_password};
use tidewear_core::db::users::NewUser;
use tidewear_core::db::{RepositoryError, UserRepository, create_pool};
use tidewear_core::{Email, EmailError, UserId, UserRole};

use super::{database_url, database_url_vars};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Name is required")]
    MissingName,

    #[error("{0}")]
    Password(#[from] AdminAuthError),

    /// Account exists and `--promote` was not given.
    #[error("A user already exists with email {0}; pass --promote to make them an admin")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a verified admin, or promote an existing account.
///
/// # Errors
///
/// Returns `AdminError` for invalid input, an existing account without
/// `promote`, or database failures.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    promote: bool,
) -> Result<UserId, AdminError> {
    let email = Email::parse(email)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::MissingName);
    }

    let url = database_url().ok_or_else(|| AdminError::MissingEnvVar(database_url_vars()))?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;
    let users = UserRepository::new(&pool);

    if users.get_by_email(&email).await?.is_some() {
        if !promote {
            return Err(AdminError::UserExists(email.to_string()));
        }
        let user = users.promote_to_admin(&email).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "Existing user promoted to admin");
        return Ok(user.id);
    }

    validate_password(password)?;
    let password_hash = hash_password(password)?;
    let user = users
        .create(NewUser {
            email: &email,
            name,
            password_hash: &password_hash,
            role: UserRole::Admin,
            email_verified: true,
        })
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin user created");
    Ok(user.id)
}
