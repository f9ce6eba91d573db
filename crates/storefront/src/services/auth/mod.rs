//! Customer authentication: password accounts with emailed one-time codes.
//!
//! Registration creates an unverified account and emails a 6-digit code.
//! The code is valid for [`OTP_TTL_MINUTES`] and only its SHA-256 digest is
//! stored. A new code can be requested once every [`RESEND_COOLDOWN_SECS`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use tidewear_core::db::UserRepository;
use tidewear_core::db::users::{NewUser, User};
use tidewear_core::{Email, UserRole};

use crate::db::{OtpRepository, RepositoryError};
use crate::services::email::EmailService;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;

/// Verification code lifetime.
pub const OTP_TTL_MINUTES: i32 = 10;

/// Minimum gap between two issued codes.
pub const RESEND_COOLDOWN_SECS: i64 = 60;

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    email: &'a EmailService,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService) -> Self {
        Self { pool, email }
    }

    /// Register an unverified customer and email them a code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::MissingName` for bad input, and
    /// `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let name = validate_name(name)?;
        let password_hash = hash_password(password)?;

        let user = UserRepository::new(self.pool)
            .create(NewUser {
                email: &email,
                name,
                password_hash: &password_hash,
                role: UserRole::Customer,
                email_verified: false,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Customer registered");
        let code = generate_verification_code();
        OtpRepository::new(self.pool)
            .insert(user.id, &hash_code(&code), OTP_TTL_MINUTES)
            .await?;
        self.send_code(&user, &code).await;
        Ok(user)
    }

    /// Check a code and mark the email verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` for unknown emails and for wrong,
    /// consumed or expired codes.
    pub async fn verify(&self, email: &str, code: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let users = UserRepository::new(self.pool);
        let user = users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        let otps = OtpRepository::new(self.pool);
        let record = otps
            .latest_active(user.id)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        if record.code_hash != hash_code(code.trim()) {
            return Err(AuthError::InvalidCode);
        }
        if !otps.consume(record.id).await? {
            return Err(AuthError::InvalidCode);
        }

        users.mark_email_verified(user.id).await?;
        tracing::info!(user_id = %user.id, "Email verified");

        Ok(User {
            email_verified: true,
            ..user
        })
    }

    /// Issue a fresh code, throttled per account.
    ///
    /// Unknown and already verified emails succeed silently so the endpoint
    /// cannot be used to discover accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ResendTooSoon` inside the cooldown window.
    pub async fn resend(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let Some(user) = UserRepository::new(self.pool).get_by_email(&email).await? else {
            return Ok(());
        };
        if user.email_verified {
            return Ok(());
        }

        let code = generate_verification_code();
        let wait = OtpRepository::new(self.pool)
            .insert_unless_recent(
                user.id,
                &hash_code(&code),
                OTP_TTL_MINUTES,
                RESEND_COOLDOWN_SECS,
            )
            .await?;
        if let Some(retry_after_secs) = wait {
            return Err(AuthError::ResendTooSoon { retry_after_secs });
        }

        self.send_code(&user, &code).await;
        Ok(())
    }

    /// Check email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, `AuthError::EmailNotVerified` before verification.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let (user, password_hash) = UserRepository::new(self.pool)
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }
        Ok(user)
    }

    // Delivery failures are logged, not surfaced: the user can ask for a resend.
    async fn send_code(&self, user: &User, code: &str) {
        if let Err(e) = self
            .email
            .send_verification_code(
                user.email.as_str(),
                &user.name,
                code,
                i64::from(OTP_TTL_MINUTES),
            )
            .await
        {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send verification code");
        }
    }
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// SHA-256 hex digest of a code, as stored in `shop.email_otp`.
#[must_use]
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::MissingName);
    }
    Ok(name)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_verification_code_range() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn test_hash_code_is_sha256_hex() {
        assert_eq!(
            hash_code("123456"),
            "8d969eef6ecad3c29a3a629280e686cf0c3f5d5a86aff3ca12020c923adc6c92"
        );
    }

    #[test]
    fn test_password_bounds() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("exactly8").is_ok());
        assert!(validate_password(&"p".repeat(128)).is_ok());
        assert!(matches!(
            validate_password(&"p".repeat(129)),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ana  ").unwrap(), "Ana");
        assert!(matches!(validate_name("   "), Err(AuthError::MissingName)));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
