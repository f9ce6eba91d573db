//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use tidewear_core::db::users::User;
use tidewear_core::{Email, UserId};

/// Session-stored admin identity.
///
/// Only identifies the admin; the role is re-checked against the database
/// on every request by [`crate::middleware::RequireAdmin`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's user ID.
    pub id: UserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
}

impl From<&User> for CurrentAdmin {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
