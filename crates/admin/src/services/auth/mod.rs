//! Admin authentication.
//!
//! Admins are ordinary accounts in `shop.user` with the `admin` role; there
//! is no separate admin user table. Login checks the Argon2 password hash and
//! then the role, so a customer with the right password still gets
//! [`AdminAuthError::NotAdmin`].

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use tidewear_core::db::UserRepository;
use tidewear_core::db::users::User;
use tidewear_core::{Email, UserRole};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Authenticate an admin by email and password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for an unknown email or
    /// wrong password, `AdminAuthError::EmailNotVerified` or
    /// `AdminAuthError::NotAdmin` when the account may not sign in here.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;
        let (user, password_hash) = UserRepository::new(self.pool)
            .get_credentials(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        check_admin(&user)?;
        Ok(user)
    }
}

/// Role and verification gate applied after the password matched.
///
/// # Errors
///
/// Returns `AdminAuthError::EmailNotVerified` or `AdminAuthError::NotAdmin`.
pub const fn check_admin(user: &User) -> Result<(), AdminAuthError> {
    if !user.email_verified {
        return Err(AdminAuthError::EmailNotVerified);
    }
    if !matches!(user.role, UserRole::Admin) {
        return Err(AdminAuthError::NotAdmin);
    }
    Ok(())
}

/// Enforce password length bounds.
///
/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` when out of bounds.
pub fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use tidewear_core::UserId;

    use super::*;

    fn user(role: UserRole, email_verified: bool) -> User {
        User {
            id: UserId::new(7),
            email: Email::parse("ops@tidewear.test").unwrap(),
            name: "Ops".to_owned(),
            role,
            email_verified,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_check_admin() {
        assert!(check_admin(&user(UserRole::Admin, true)).is_ok());
        assert!(matches!(
            check_admin(&user(UserRole::Customer, true)),
            Err(AdminAuthError::NotAdmin)
        ));
        assert!(matches!(
            check_admin(&user(UserRole::Admin, false)),
            Err(AdminAuthError::EmailNotVerified)
        ));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }
}
