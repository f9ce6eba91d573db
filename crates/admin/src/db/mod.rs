//! Admin database access.
//!
//! Reads shared with the storefront come from `tidewear_core::db`. Writes
//! that only admins perform live here:
//!
//! - [`taxonomy`] - Brand, category and color create/update/delete
//! - [`catalog`] - Product create/update/delete, including sizes and colors
//! - [`media`] - Product image records
//!
//! Users, orders and shipping settings are written through the core
//! repositories, which already carry the invariants (order transitions,
//! singleton settings row).

pub mod catalog;
pub mod media;
pub mod taxonomy;

pub use catalog::CatalogRepository;
pub use media::MediaRepository;
pub use taxonomy::TaxonomyWriteRepository;
pub use tidewear_core::db::{RepositoryError, create_pool};

/// Map a foreign key violation to [`RepositoryError::Conflict`] with
/// `message`, a unique violation to one naming the slug, and anything else
/// to [`RepositoryError::Database`].
pub(crate) fn constraint_error(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::conflict_on_unique(e, "slug is already taken")
}
