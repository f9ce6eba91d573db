//! Admin services.
//!
//! - `auth` - Password login restricted to admin accounts
//! - `media` - Product image storage

pub mod auth;
pub mod media;

pub use auth::AdminAuthService;
pub use media::MediaStore;
