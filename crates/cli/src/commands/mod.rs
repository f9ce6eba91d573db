//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Environment variables tried, in order, for the database connection.
const DATABASE_URL_VARS: &[&str] = &[
    "DATABASE_URL",
    "ADMIN_DATABASE_URL",
    "STOREFRONT_DATABASE_URL",
];

/// The shared database URL, after loading `.env`.
///
/// Both servers use the same database, so any of their variables will do.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    DATABASE_URL_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
}

/// Human-readable list of the variables [`database_url`] looks at.
pub fn database_url_vars() -> String {
    DATABASE_URL_VARS.join(" / ")
}
