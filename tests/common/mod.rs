#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use product_catalog::{
    db::{self, DbConfig},
    entities::{BrandModel, CategoryModel, ManufacturerModel, ProductModel, VariantTypeModel, VariantValueModel},
    media::{LocalMediaStorage, MediaStorage},
    services::{
        brands::CreateBrandInput,
        categories::CreateCategoryInput,
        manufacturers::CreateManufacturerInput,
        products::CreateProductInput,
        variants::{CreateVariantValueInput, VariantTypeInput},
    },
    CatalogServices,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tempfile::TempDir;
use uuid::Uuid;

/// Catalog services backed by a migrated in-memory SQLite database and a
/// throwaway media directory.
pub struct TestCatalog {
    pub db: Arc<DatabaseConnection>,
    pub services: CatalogServices,
    pub storage: Arc<LocalMediaStorage>,
    _media_dir: TempDir,
}

impl TestCatalog {
    pub async fn new() -> Self {
        // One connection: every pooled connection would otherwise get its own in-memory database.
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout: Duration::from_secs(3600),
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let media_dir = tempfile::tempdir().expect("create media dir");
        let storage = Arc::new(LocalMediaStorage::new(media_dir.path()));
        let db = Arc::new(pool);
        let media: Arc<dyn MediaStorage> = storage.clone();
        let services = CatalogServices::new(db.clone(), media);

        Self {
            db,
            services,
            storage,
            _media_dir: media_dir,
        }
    }

    pub async fn manufacturer(&self, name: &str) -> ManufacturerModel {
        self.services
            .manufacturers
            .create(CreateManufacturerInput {
                name: name.to_string(),
                description: None,
            })
            .await
            .expect("create manufacturer")
    }

    pub async fn brand(&self, manufacturer_id: Uuid, name: &str) -> BrandModel {
        self.services
            .brands
            .create(CreateBrandInput {
                manufacturer_id,
                name: name.to_string(),
            })
            .await
            .expect("create brand")
    }

    pub async fn category(&self, name: &str, parent_id: Option<Uuid>) -> CategoryModel {
        self.services
            .categories
            .create(CreateCategoryInput {
                name: name.to_string(),
                parent_id,
            })
            .await
            .expect("create category")
    }

    pub async fn variant_type(&self, name: &str) -> VariantTypeModel {
        self.services
            .variants
            .create_type(VariantTypeInput {
                name: name.to_string(),
            })
            .await
            .expect("create variant type")
    }

    pub async fn variant_value(&self, variant_type_id: Uuid, value: &str) -> VariantValueModel {
        self.services
            .variants
            .create_value(CreateVariantValueInput {
                variant_type_id,
                value: value.to_string(),
            })
            .await
            .expect("create variant value")
    }

    pub async fn product(&self, brand: &BrandModel, name: &str, retail_price: Decimal) -> ProductModel {
        self.services
            .products
            .create(product_input(brand, name, retail_price))
            .await
            .expect("create product")
    }
}

pub fn product_input(brand: &BrandModel, name: &str, retail_price: Decimal) -> CreateProductInput {
    CreateProductInput {
        manufacturer_id: brand.manufacturer_id,
        brand_id: brand.id,
        name: name.to_string(),
        description: format!("{} description", name),
        retail_price,
        selling_price: retail_price,
        stock: 5,
        category_ids: Vec::new(),
    }
}
