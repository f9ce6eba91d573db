//! Seed the catalog from a YAML document.
//!
//! Every record is upserted, so re-running the same file is harmless:
//! brands and categories match on slug, colors on name (case-insensitive),
//! products on slug.
//!
//! ```yaml
//! brands:
//!   - name: Saltline
//! categories:
//!   - { name: T-Shirts, slug: tees }
//! colors:
//!   - { name: Navy, hex: "#1f2a44" }
//! products:
//!   - title: Linen Shirt
//!     sku: LIN-001
//!     price: "49.90"
//!     stock: 12
//!     sizes: [S, M, L]
//!     brand: saltline
//!     category: tees
//!     colors: [Navy]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{error, info};

use tidewear_admin::db::catalog::{ProductWrite, normalize_sizes};
use tidewear_admin::db::taxonomy::normalize_hex;
use tidewear_admin::db::{CatalogRepository, TaxonomyWriteRepository};
use tidewear_core::db::{ProductRepository, TaxonomyRepository, create_pool};
use tidewear_core::{BrandId, CategoryId, ColorId, Price, ProductRef, Slug};

use super::{database_url, database_url_vars};

/// Top-level seed document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub brands: Vec<NamedSeed>,
    #[serde(default)]
    pub categories: Vec<NamedSeed>,
    #[serde(default)]
    pub colors: Vec<ColorSeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A brand or category.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedSeed {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorSeed {
    pub name: String,
    pub hex: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub sku: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Brand slug.
    pub brand: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Color names.
    #[serde(default)]
    pub colors: Vec<String>,
    pub attributes: Option<Value>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub updated: usize,
}

/// Check the document before touching the database.
///
/// Returns one message per problem; an empty list means the seed is usable.
#[must_use]
pub fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    for (kind, list) in [("brand", &seed.brands), ("category", &seed.categories)] {
        for entry in list {
            if let Err(e) = Slug::explicit_or_from(entry.slug.as_deref(), &entry.name) {
                errors.push(format!("{kind} '{}': {e}", entry.name));
            }
        }
    }

    for color in &seed.colors {
        if color.name.trim().is_empty() {
            errors.push("color with an empty name".to_owned());
        }
        if normalize_hex(&color.hex).is_none() {
            errors.push(format!("color '{}': invalid hex '{}'", color.name, color.hex));
        }
    }

    for product in &seed.products {
        let title = product.title.trim();
        if title.is_empty() {
            errors.push("product with an empty title".to_owned());
        }
        if let Err(e) = Slug::explicit_or_from(product.slug.as_deref(), title) {
            errors.push(format!("product '{title}': {e}"));
        }
        if let Err(label) = normalize_sizes(&product.sizes) {
            errors.push(format!("product '{title}': size '{label}' contains a comma"));
        }
        if product.attributes.as_ref().is_some_and(|a| !a.is_object()) {
            errors.push(format!("product '{title}': attributes must be an object"));
        }
        if let Some(brand) = &product.brand
            && !declared(&seed.brands, brand)
        {
            info!(
                product = title,
                brand = %brand,
                "Brand not in file; expecting it in the database"
            );
        }
        if let Some(category) = &product.category
            && !declared(&seed.categories, category)
        {
            info!(
                product = title,
                category = %category,
                "Category not in file; expecting it in the database"
            );
        }
    }

    errors
}

fn declared(list: &[NamedSeed], slug: &str) -> bool {
    list.iter().any(|entry| {
        Slug::explicit_or_from(entry.slug.as_deref(), &entry.name)
            .is_ok_and(|s| s.as_str() == slug)
    })
}

/// Seed the catalog from `file_path`.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, a reference cannot
/// be resolved, or a database write fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let url = database_url().ok_or_else(|| format!("{} not set", database_url_vars()))?;
    let pool = create_pool(&url).await?;
    info!("Connected to database");

    let brands = seed_brands(&pool, &seed.brands).await?;
    let categories = seed_categories(&pool, &seed.categories).await?;
    let colors = seed_colors(&pool, &seed.colors).await?;
    let products = seed_products(&pool, &seed.products).await?;

    info!("Seeding complete!");
    info!("  Brands: {} created, {} updated", brands.created, brands.updated);
    info!("  Categories: {} created, {} updated", categories.created, categories.updated);
    info!("  Colors: {} created, {} updated", colors.created, colors.updated);
    info!("  Products: {} created, {} updated", products.created, products.updated);

    Ok(())
}

async fn seed_brands(
    pool: &PgPool,
    entries: &[NamedSeed],
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let existing: HashMap<String, BrandId> = TaxonomyRepository::new(pool)
        .brands()
        .await?
        .into_iter()
        .map(|b| (b.slug, b.id))
        .collect();
    let writes = TaxonomyWriteRepository::new(pool);

    let mut summary = SeedSummary::default();
    for entry in entries {
        let name = entry.name.trim();
        let slug = Slug::explicit_or_from(entry.slug.as_deref(), name)?;
        if let Some(id) = existing.get(slug.as_str()) {
            writes.update_brand(*id, name, &slug).await?;
            summary.updated += 1;
        } else {
            writes.create_brand(name, &slug).await?;
            summary.created += 1;
        }
    }
    Ok(summary)
}

async fn seed_categories(
    pool: &PgPool,
    entries: &[NamedSeed],
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let existing: HashMap<String, CategoryId> = TaxonomyRepository::new(pool)
        .categories()
        .await?
        .into_iter()
        .map(|c| (c.slug, c.id))
        .collect();
    let writes = TaxonomyWriteRepository::new(pool);

    let mut summary = SeedSummary::default();
    for entry in entries {
        let name = entry.name.trim();
        let slug = Slug::explicit_or_from(entry.slug.as_deref(), name)?;
        if let Some(id) = existing.get(slug.as_str()) {
            writes.update_category(*id, name, &slug).await?;
            summary.updated += 1;
        } else {
            writes.create_category(name, &slug).await?;
            summary.created += 1;
        }
    }
    Ok(summary)
}

async fn seed_colors(
    pool: &PgPool,
    entries: &[ColorSeed],
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let existing: HashMap<String, ColorId> = TaxonomyRepository::new(pool)
        .colors()
        .await?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();
    let writes = TaxonomyWriteRepository::new(pool);

    let mut summary = SeedSummary::default();
    for entry in entries {
        let name = entry.name.trim();
        let hex = normalize_hex(&entry.hex).ok_or_else(|| format!("invalid hex for {name}"))?;
        if let Some(id) = existing.get(&name.to_lowercase()) {
            writes.update_color(*id, name, &hex).await?;
            summary.updated += 1;
        } else {
            writes.create_color(name, &hex).await?;
            summary.created += 1;
        }
    }
    Ok(summary)
}

async fn seed_products(
    pool: &PgPool,
    entries: &[ProductSeed],
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    // Re-read taxonomy so records created above resolve.
    let taxonomy = TaxonomyRepository::new(pool);
    let brands: HashMap<String, BrandId> = taxonomy
        .brands()
        .await?
        .into_iter()
        .map(|b| (b.slug, b.id))
        .collect();
    let categories: HashMap<String, CategoryId> = taxonomy
        .categories()
        .await?
        .into_iter()
        .map(|c| (c.slug, c.id))
        .collect();
    let colors: HashMap<String, ColorId> = taxonomy
        .colors()
        .await?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();

    let products = ProductRepository::new(pool);
    let catalog = CatalogRepository::new(pool);

    let mut summary = SeedSummary::default();
    for entry in entries {
        let write = product_write(entry, &brands, &categories, &colors)?;
        let existing = products
            .find(&ProductRef::Slug(write.slug.to_string()), true)
            .await?;

        if let Some(product) = existing {
            catalog.update(product.id, &write).await?;
            summary.updated += 1;
        } else {
            let product = catalog.create(&write).await?;
            info!(product_id = %product.id, slug = %product.slug, "Product created");
            summary.created += 1;
        }
    }
    Ok(summary)
}

/// Resolve a product entry's references into a write.
fn product_write(
    entry: &ProductSeed,
    brands: &HashMap<String, BrandId>,
    categories: &HashMap<String, CategoryId>,
    colors: &HashMap<String, ColorId>,
) -> Result<ProductWrite, String> {
    let title = entry.title.trim();

    let brand_id = entry
        .brand
        .as_deref()
        .map(|slug| {
            brands
                .get(slug)
                .copied()
                .ok_or_else(|| format!("product '{title}': unknown brand '{slug}'"))
        })
        .transpose()?;
    let category_id = entry
        .category
        .as_deref()
        .map(|slug| {
            categories
                .get(slug)
                .copied()
                .ok_or_else(|| format!("product '{title}': unknown category '{slug}'"))
        })
        .transpose()?;
    let color_ids = entry
        .colors
        .iter()
        .map(|name| {
            colors
                .get(&name.trim().to_lowercase())
                .copied()
                .ok_or_else(|| format!("product '{title}': unknown color '{name}'"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let sizes = normalize_sizes(&entry.sizes)
        .map_err(|label| format!("product '{title}': size '{label}' contains a comma"))?;
    let slug = Slug::explicit_or_from(entry.slug.as_deref(), title)
        .map_err(|e| format!("product '{title}': {e}"))?;

    Ok(ProductWrite {
        title: title.to_owned(),
        slug,
        description: entry.description.clone(),
        sku: entry
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        price: entry.price,
        stock: entry.stock,
        brand_id,
        category_id,
        sizes: Some(sizes),
        color_ids: Some(color_ids),
        attributes: entry.attributes.clone(),
        is_active: Some(entry.is_active),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
brands:
  - name: Saltline
categories:
  - { name: T-Shirts, slug: tees }
colors:
  - { name: Navy, hex: "#1f2a44" }
products:
  - title: Linen Shirt
    sku: LIN-001
    price: "49.90"
    stock: 12
    sizes: [S, " M", S, L]
    brand: saltline
    category: tees
    colors: [navy]
    attributes:
      sizeStock: { S: 3, M: 4, L: 5 }
  - title: Canvas Tote
    price: 19
    is_active: false
"##;

    fn sample() -> CatalogSeed {
        serde_yaml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let seed = sample();
        assert_eq!(seed.brands.len(), 1);
        assert_eq!(seed.categories.first().unwrap().slug.as_deref(), Some("tees"));
        assert_eq!(seed.products.len(), 2);

        let tote = seed.products.get(1).unwrap();
        assert!(!tote.is_active);
        assert_eq!(tote.stock, 0);
        assert!(tote.sizes.is_empty());
        assert_eq!(tote.price, Price::from_cents(1900));
        assert!(seed.products.first().unwrap().is_active);
    }

    #[test]
    fn test_sample_is_valid() {
        assert!(validate(&sample()).is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<CatalogSeed, _> = serde_yaml::from_str("widgets: []");
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let yaml = "products:\n  - title: Cap\n    price: \"-1\"\n";
        assert!(serde_yaml::from_str::<CatalogSeed>(yaml).is_err());
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let seed: CatalogSeed = serde_yaml::from_str(
            r##"
brands:
  - { name: "!!!" }
colors:
  - { name: Teal, hex: "teal" }
products:
  - title: Scarf
    price: 10
    sizes: ["S,M"]
    attributes: [1, 2]
"##,
        )
        .unwrap();

        let errors = validate(&seed);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("invalid hex")));
        assert!(errors.iter().any(|e| e.contains("contains a comma")));
    }

    #[test]
    fn test_product_write_resolves_references() {
        let seed = sample();
        let brands = HashMap::from([("saltline".to_owned(), BrandId::new(1))]);
        let categories = HashMap::from([("tees".to_owned(), CategoryId::new(2))]);
        let colors = HashMap::from([("navy".to_owned(), ColorId::new(3))]);

        let write =
            product_write(seed.products.first().unwrap(), &brands, &categories, &colors).unwrap();
        assert_eq!(write.slug.as_str(), "linen-shirt");
        assert_eq!(write.brand_id, Some(BrandId::new(1)));
        assert_eq!(write.category_id, Some(CategoryId::new(2)));
        assert_eq!(write.color_ids, Some(vec![ColorId::new(3)]));
        assert_eq!(
            write.sizes,
            Some(vec!["S".to_owned(), "M".to_owned(), "L".to_owned()])
        );
        assert_eq!(write.is_active, Some(true));
    }

    #[test]
    fn test_product_write_unknown_brand() {
        let seed = sample();
        let err = product_write(
            seed.products.first().unwrap(),
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
        )
        .unwrap_err();
        assert!(err.contains("unknown brand 'saltline'"));
    }
}
