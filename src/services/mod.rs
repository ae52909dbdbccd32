//! CRUD services for the catalog, one per aggregate.

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::media::MediaStorage;
use crate::slug::slugify;
use validator::ValidationError;

pub mod brands;
pub mod categories;
pub mod manufacturers;
pub mod products;
pub mod variants;

pub use brands::BrandService;
pub use categories::CategoryService;
pub use manufacturers::ManufacturerService;
pub use products::ProductService;
pub use variants::VariantService;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Zero-based page request for list operations
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub per_page: Option<u64>,
}

impl Page {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page,
            per_page: Some(per_page),
        }
    }

    /// Page size clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> u64 {
        self.per_page.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// One page of results plus the total row count
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Every catalog service sharing one connection pool and media backend
#[derive(Clone)]
pub struct CatalogServices {
    pub manufacturers: ManufacturerService,
    pub brands: BrandService,
    pub categories: CategoryService,
    pub variants: VariantService,
    pub products: ProductService,
}

impl CatalogServices {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<dyn MediaStorage>) -> Self {
        Self {
            manufacturers: ManufacturerService::new(db.clone(), media.clone()),
            brands: BrandService::new(db.clone(), media.clone()),
            categories: CategoryService::new(db.clone(), media.clone()),
            variants: VariantService::new(db.clone()),
            products: ProductService::new(db, media),
        }
    }
}

/// Best-effort removal of a file no row references anymore.
pub(crate) async fn discard_media(media: &dyn MediaStorage, path: &str) {
    if let Err(e) = media.delete(path).await {
        tracing::warn!(path = %path, error = %e, "Failed to remove stale media file");
    }
}

/// Rejects names that would leave an entity with an empty slug.
pub(crate) fn validate_sluggable(name: &str) -> Result<(), ValidationError> {
    if slugify(name).is_empty() {
        let mut err = ValidationError::new("slug");
        err.message = Some("name must contain at least one letter or digit".into());
        return Err(err);
    }
    Ok(())
}

/// `Some("")` clears an optional text field, `Some(text)` replaces it.
pub(crate) fn optional_text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_limit_is_clamped() {
        assert_eq!(Page::default().limit(), 20);
        assert_eq!(Page::new(0, 0).limit(), 1);
        assert_eq!(Page::new(0, 500).limit(), 100);
        assert_eq!(Page::new(3, 50).limit(), 50);
    }

    #[test]
    fn sluggable_names_need_an_alphanumeric() {
        assert!(validate_sluggable("Red").is_ok());
        assert!(validate_sluggable("--- !!").is_err());
    }

    #[test]
    fn blank_optional_text_clears() {
        assert_eq!(optional_text("  ".to_string()), None);
        assert_eq!(optional_text("Made in Ohio".to_string()), Some("Made in Ohio".to_string()));
    }
}
