//! Tidewear Core - shared types, computations and repositories.
//!
//! Used by every Tidewear component:
//! - `storefront` - public JSON API for shoppers
//! - `admin` - catalog, order and user management API
//! - `cli` - migrations, admin bootstrap and catalog seeding
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, slugs and statuses
//! - [`shipping`] - Shipping settings and the delivery-date estimator
//! - [`inventory`] - Per-size remaining stock resolution
//! - [`pagination`] - Page parameters and paged responses
//! - `db` (feature `postgres`) - Connection pool and the repositories both
//!   servers read from

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod inventory;
pub mod pagination;
pub mod shipping;
pub mod types;

#[cfg(feature = "postgres")]
pub mod db;

pub use inventory::{HistoricalItem, SizeStock, SizeStockInput, resolve_size_stock};
pub use pagination::{Page, PageParams};
pub use shipping::{
    DeliveryEstimate, DeliveryRange, MAX_SHIPPING_DAYS, ShippingSettings, add_business_days,
    estimate_delivery,
};
pub use types::*;
