//! Business logic services for the storefront.
//!
//! - `auth` - Registration, email verification and password login
//! - `checkout` - Orders from carts and simulated payment
//! - `email` - Transactional email delivery

pub mod auth;
pub mod checkout;
pub mod email;

pub use email::EmailService;
