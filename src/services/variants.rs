use crate::{
    entities::{
        product_variant,
        variant_type::{self, Entity as VariantType, Model as VariantTypeModel},
        variant_value::{self, Entity as VariantValue, Model as VariantValueModel},
    },
    errors::ServiceError,
    services::{validate_sluggable, Page, Paginated},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Service for variant axes (types) and the values on them
#[derive(Clone)]
pub struct VariantService {
    db: Arc<DatabaseConnection>,
}

impl VariantService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_type(&self, input: VariantTypeInput) -> Result<VariantTypeModel, ServiceError> {
        input.validate()?;

        let variant_type = variant_type::ActiveModel {
            name: Set(input.name),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(variant_type_id = %variant_type.id, slug = %variant_type.slug, "Created variant type");
        Ok(variant_type)
    }

    #[instrument(skip(self))]
    pub async fn get_type(&self, id: Uuid) -> Result<VariantTypeModel, ServiceError> {
        VariantType::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Variant type", id))
    }

    #[instrument(skip(self))]
    pub async fn list_types(&self, page: Page) -> Result<Paginated<VariantTypeModel>, ServiceError> {
        let limit = page.limit();
        let paginator = VariantType::find()
            .order_by_asc(variant_type::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.page).await?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: limit,
        })
    }

    /// Rename a variant type; slugs of its values and their product variants follow
    #[instrument(skip(self))]
    pub async fn rename_type(
        &self,
        id: Uuid,
        input: VariantTypeInput,
    ) -> Result<VariantTypeModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let current = VariantType::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Variant type", id))?;
        let mut active: variant_type::ActiveModel = current.into();
        active.name = Set(input.name);
        let variant_type = active.update(&txn).await?;

        let values = VariantValue::find()
            .filter(variant_value::Column::VariantTypeId.eq(id))
            .all(&txn)
            .await?;
        for value in values {
            let value_id = value.id;
            let active: variant_value::ActiveModel = value.into();
            active.update(&txn).await?;
            resave_product_variants(&txn, product_variant::Column::VariantValueId, value_id)
                .await?;
        }

        txn.commit().await?;

        info!(variant_type_id = %id, "Renamed variant type");
        Ok(variant_type)
    }

    /// Delete a variant type with all of its values and the product variants using them
    #[instrument(skip(self))]
    pub async fn delete_type(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = VariantType::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Variant type", id));
        }
        info!(variant_type_id = %id, "Deleted variant type");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_value(
        &self,
        input: CreateVariantValueInput,
    ) -> Result<VariantValueModel, ServiceError> {
        input.validate()?;

        // The slug needs the type's name, so a missing type fails before the insert.
        VariantType::find_by_id(input.variant_type_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::missing_reference("Variant type", input.variant_type_id))?;

        let value = variant_value::ActiveModel {
            variant_type_id: Set(input.variant_type_id),
            value: Set(input.value),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(variant_value_id = %value.id, slug = %value.slug, "Created variant value");
        Ok(value)
    }

    #[instrument(skip(self))]
    pub async fn get_value(&self, id: Uuid) -> Result<VariantValueModel, ServiceError> {
        VariantValue::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Variant value", id))
    }

    /// Values on one axis, ordered by value
    #[instrument(skip(self))]
    pub async fn list_values(
        &self,
        variant_type_id: Uuid,
    ) -> Result<Vec<VariantValueModel>, ServiceError> {
        Ok(VariantValue::find()
            .filter(variant_value::Column::VariantTypeId.eq(variant_type_id))
            .order_by_asc(variant_value::Column::Value)
            .all(&*self.db)
            .await?)
    }

    /// Change the value text; product variant slugs follow
    #[instrument(skip(self))]
    pub async fn update_value(
        &self,
        id: Uuid,
        input: UpdateVariantValueInput,
    ) -> Result<VariantValueModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let current = VariantValue::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Variant value", id))?;
        let mut active: variant_value::ActiveModel = current.into();
        active.value = Set(input.value);
        let value = active.update(&txn).await?;
        resave_product_variants(&txn, product_variant::Column::VariantValueId, id).await?;

        txn.commit().await?;

        info!(variant_value_id = %id, "Updated variant value");
        Ok(value)
    }

    /// Delete a variant value and the product variants using it
    #[instrument(skip(self))]
    pub async fn delete_value(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = VariantValue::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Variant value", id));
        }
        info!(variant_value_id = %id, "Deleted variant value");
        Ok(())
    }
}

/// Re-saves the product variants matching `column = id` so their derived slugs are recomputed.
pub(crate) async fn resave_product_variants<C>(
    db: &C,
    column: product_variant::Column,
    id: Uuid,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let variants = product_variant::Entity::find()
        .filter(column.eq(id))
        .all(db)
        .await?;
    let count = variants.len();
    for variant in variants {
        let active: product_variant::ActiveModel = variant.into();
        active.update(db).await?;
    }
    debug!(count, "Re-derived product variant slugs");
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VariantTypeInput {
    #[validate(length(min = 1, max = 64), custom = "validate_sluggable")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVariantValueInput {
    pub variant_type_id: Uuid,
    #[validate(length(min = 1, max = 64), custom = "validate_sluggable")]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateVariantValueInput {
    #[validate(length(min = 1, max = 64), custom = "validate_sluggable")]
    pub value: String,
}
