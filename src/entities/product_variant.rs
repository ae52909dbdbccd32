use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validate_money;
use crate::slug::slugify_parts;

/// A product offered at one variant value, e.g. "Classic Tee" in "Color: Red"
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_value_id: Uuid,
    /// Derived from product name, variant type name and value
    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 1288))]
    pub slug: String,
    /// Replaces the product's retail price when present
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    #[validate(custom = "validate_money")]
    pub price_override: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::variant_value::Entity",
        from = "Column::VariantValueId",
        to = "super::variant_value::Column::Id",
        on_delete = "Cascade"
    )]
    VariantValue,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::variant_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VariantValue.def()
    }
}

impl Model {
    /// Effective price: the override when set, otherwise the product's retail price.
    ///
    /// `product` must be the row this variant belongs to.
    pub fn get_price(&self, product: &super::product::Model) -> Decimal {
        debug_assert_eq!(product.id, self.product_id);
        self.price_override.unwrap_or(product.retail_price)
    }

    /// Loads the parent product and resolves [`Model::get_price`].
    pub async fn resolve_price<C>(&self, db: &C) -> Result<Decimal, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(price) = self.price_override {
            return Ok(price);
        }
        let product = super::product::Entity::find_by_id(self.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!("Product with ID {} not found", self.product_id))
            })?;
        Ok(self.get_price(&product))
    }
}

async fn derive_slug<C>(db: &C, product_id: Uuid, variant_value_id: Uuid) -> Result<String, DbErr>
where
    C: ConnectionTrait,
{
    let product = super::product::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Product with ID {} not found", product_id)))?;
    let (value, variant_type) = super::variant_value::Entity::find_by_id(variant_value_id)
        .find_also_related(super::variant_type::Entity)
        .one(db)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("Variant value with ID {} not found", variant_value_id))
        })?;
    let type_name = variant_type.map(|t| t.name).unwrap_or_default();
    Ok(slugify_parts(&[&product.name, &type_name, &value.value]))
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active_model.stock {
                active_model.stock = Set(0);
            }
            if let ActiveValue::NotSet = active_model.price_override {
                active_model.price_override = Set(None);
            }
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        let product_id = match &active_model.product_id {
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(*id),
            ActiveValue::NotSet => None,
        };
        let variant_value_id = match &active_model.variant_value_id {
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(*id),
            ActiveValue::NotSet => None,
        };
        active_model.slug = match (product_id, variant_value_id) {
            (Some(product_id), Some(value_id)) => Set(derive_slug(db, product_id, value_id).await?),
            _ => ActiveValue::NotSet,
        };

        if let Ok(model) = Model::try_from(active_model.clone()) {
            super::validate_model(&model)?;
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(retail_price: Decimal) -> super::super::product::Model {
        let now = Utc::now();
        super::super::product::Model {
            id: Uuid::nil(),
            manufacturer_id: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            name: "Classic Tee".to_string(),
            slug: "classic-tee".to_string(),
            description: "Cotton".to_string(),
            retail_price,
            selling_price: retail_price,
            stock: 10,
            created_at: now,
            updated_at: now,
        }
    }

    fn variant(price_override: Option<Decimal>) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            product_id: Uuid::nil(),
            variant_value_id: Uuid::new_v4(),
            slug: "classic-tee--color--red".to_string(),
            price_override,
            stock: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn override_wins_when_present() {
        assert_eq!(variant(Some(dec!(9.99))).get_price(&product(dec!(19.99))), dec!(9.99));
    }

    #[test]
    fn falls_back_to_retail_price() {
        assert_eq!(variant(None).get_price(&product(dec!(19.99))), dec!(19.99));
    }

    #[test]
    fn zero_override_is_still_an_override() {
        assert_eq!(variant(Some(Decimal::ZERO)).get_price(&product(dec!(19.99))), Decimal::ZERO);
    }

    #[test]
    fn negative_stock_fails_validation() {
        let mut v = variant(None);
        v.stock = -1;
        assert!(v.validate().is_err());
    }
}
