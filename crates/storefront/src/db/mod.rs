//! Storefront database access.
//!
//! Shared catalog, user and order reads come from `tidewear_core::db`; the
//! tables only shoppers write live here:
//!
//! - `email_otp` - Email verification codes
//! - `cart_item` - Cart lines
//! - `wishlist_item` - Saved products
//! - `order`, `order_item`, `payment` - Checkout and simulated payment

pub mod cart;
pub mod checkout;
pub mod otp;
pub mod wishlist;

pub use cart::CartRepository;
pub use otp::OtpRepository;
pub use tidewear_core::db::{RepositoryError, create_pool};
pub use wishlist::WishlistRepository;
