//! The admin capability check.
//!
//! Every admin route except login takes [`RequireAdmin`]. The session only
//! says who is logged in; whether they are still an admin is read from the
//! database on each request, so a demotion or deletion takes effect on the
//! next request.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use tidewear_core::UserRole;
use tidewear_core::db::UserRepository;
use tidewear_core::db::users::User;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in admin.
///
/// Rejects with 401 when nobody is logged in (or the account is gone) and
/// 403 when the account is no longer an admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("not logged in".to_owned()))?;

        let current: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized("not logged in".to_owned()))?;

        let user = UserRepository::new(state.pool())
            .get_by_id(current.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_owned()))?;

        authorize(user).map(Self)
    }
}

/// The role verdict, separate from session and database plumbing.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for anyone but an admin.
pub fn authorize(user: User) -> Result<User, AppError> {
    if user.role == UserRole::Admin {
        Ok(user)
    } else {
        Err(AppError::Forbidden("admin access required".to_owned()))
    }
}

/// Store the admin in a fresh session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use tidewear_core::{Email, UserId};

    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("ops@tidewear.test").unwrap(),
            name: "Ops".to_owned(),
            role,
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(user(UserRole::Admin)).is_ok());
        assert!(matches!(
            authorize(user(UserRole::Customer)),
            Err(AppError::Forbidden(_))
        ));
    }
}
