//! Catalog entities.
//!
//! Every entity with a name derives its slug in `before_save`, so the rule holds
//! for any write path, not only the services.

use rust_decimal::Decimal;
use sea_orm::DbErr;
use validator::{Validate, ValidationError};

pub mod brand;
pub mod category;
pub mod manufacturer;
pub mod product;
pub mod product_category;
pub mod product_image;
pub mod product_variant;
pub mod variant_type;
pub mod variant_value;

// Re-export entities
pub use brand::{Entity as Brand, Model as BrandModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use manufacturer::{Entity as Manufacturer, Model as ManufacturerModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_category::{Entity as ProductCategory, Model as ProductCategoryModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
pub use variant_type::{Entity as VariantType, Model as VariantTypeModel};
pub use variant_value::{Entity as VariantValue, Model as VariantValueModel};

/// Largest magnitude a `decimal(10, 2)` column can hold, exclusive.
const MONEY_LIMIT: i64 = 100_000_000;

pub(crate) fn validate_model<M: Validate>(model: &M) -> Result<(), DbErr> {
    model
        .validate()
        .map_err(|err| DbErr::Custom(format!("Validation error: {}", err)))
}

/// Accepts amounts that fit a `decimal(10, 2)` column without rounding.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > 2 {
        let mut err = ValidationError::new("money_scale");
        err.message = Some("amount cannot have more than 2 decimal places".into());
        return Err(err);
    }
    if value.abs() >= Decimal::from(MONEY_LIMIT) {
        let mut err = ValidationError::new("money_range");
        err.message = Some("amount cannot have more than 8 integer digits".into());
        return Err(err);
    }
    Ok(())
}
