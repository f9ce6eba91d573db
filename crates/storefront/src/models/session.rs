//! Session-related types.

use serde::{Deserialize, Serialize};

use tidewear_core::{Email, UserId, UserRole};
use tidewear_core::db::users::User;

/// Session-stored user identity.
///
/// Written on login or successful verification; handlers trust it without
/// a database round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Session keys.
pub mod keys {
    /// The logged-in [`super::CurrentUser`].
    pub const CURRENT_USER: &str = "current_user";
}
