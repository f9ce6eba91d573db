//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tidewear_core::EmailError),

    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("password validation failed: {0}")]
    WeakPassword(String),

    #[error("name is required")]
    MissingName,

    /// Login attempted before the email was verified.
    #[error("email not verified")]
    EmailNotVerified,

    /// Wrong, consumed or expired verification code.
    #[error("invalid or expired verification code")]
    InvalidCode,

    /// A code was issued too recently.
    #[error("verification code requested too soon, retry in {retry_after_secs}s")]
    ResendTooSoon { retry_after_secs: i64 },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}
