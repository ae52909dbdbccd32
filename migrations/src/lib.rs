pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_manufacturers_table;
mod m20250601_000002_create_brands_table;
mod m20250601_000003_create_categories_table;
mod m20250601_000004_create_variant_types_table;
mod m20250601_000005_create_variant_values_table;
mod m20250601_000006_create_products_table;
mod m20250601_000007_create_product_categories_table;
mod m20250601_000008_create_product_variants_table;
mod m20250601_000009_create_product_images_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_manufacturers_table::Migration),
            Box::new(m20250601_000002_create_brands_table::Migration),
            Box::new(m20250601_000003_create_categories_table::Migration),
            Box::new(m20250601_000004_create_variant_types_table::Migration),
            Box::new(m20250601_000005_create_variant_values_table::Migration),
            Box::new(m20250601_000006_create_products_table::Migration),
            Box::new(m20250601_000007_create_product_categories_table::Migration),
            Box::new(m20250601_000008_create_product_variants_table::Migration),
            Box::new(m20250601_000009_create_product_images_table::Migration),
        ]
    }
}
