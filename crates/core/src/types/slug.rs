//! URL slugs for brands, categories and products.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits and single hyphens")]
    InvalidCharacters,
}

/// A lower-case, hyphen-separated identifier such as `linen-shirt`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 120;

    /// Validate an explicit slug.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError`] unless the input is non-empty, short enough and
    /// made of `[a-z0-9]` runs separated by single hyphens.
    pub fn parse(input: &str) -> Result<Self, SlugError> {
        if input.is_empty() {
            return Err(SlugError::Empty);
        }
        if input.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let well_formed = input.split('-').all(|run| {
            !run.is_empty() && run.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        });
        if !well_formed {
            return Err(SlugError::InvalidCharacters);
        }
        Ok(Self(input.to_owned()))
    }

    /// Derive a slug from a display name: ASCII alphanumerics are kept
    /// (lower-cased), every other run of characters becomes one hyphen.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] when the name has no ASCII alphanumerics.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        slug.truncate(Self::MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
        Self::parse(&slug)
    }

    /// Use `explicit` when given, otherwise derive from `name`.
    ///
    /// # Errors
    ///
    /// Propagates the [`SlugError`] from whichever path was taken.
    pub fn explicit_or_from(explicit: Option<&str>, name: &str) -> Result<Self, SlugError> {
        match explicit.map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => Self::parse(slug),
            None => Self::from_name(name),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Slug::from_name("Linen Shirt").unwrap().as_str(), "linen-shirt");
        assert_eq!(
            Slug::from_name("  Crème & Co. -- Summer '24 ").unwrap().as_str(),
            "cr-me-co-summer-24"
        );
    }

    #[test]
    fn test_from_name_without_alphanumerics() {
        assert_eq!(Slug::from_name("¡¿!?"), Err(SlugError::Empty));
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(Slug::parse("ok-slug-2").is_ok());
        assert_eq!(Slug::parse("Upper"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("double--hyphen"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("-leading"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_explicit_or_from() {
        assert_eq!(
            Slug::explicit_or_from(Some("tees"), "T-Shirts").unwrap().as_str(),
            "tees"
        );
        assert_eq!(
            Slug::explicit_or_from(Some("  "), "T-Shirts").unwrap().as_str(),
            "t-shirts"
        );
        assert!(Slug::explicit_or_from(Some("Bad Slug"), "x").is_err());
    }
}
