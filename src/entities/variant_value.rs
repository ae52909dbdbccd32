use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::slug::{active_str, slugify_parts};

/// One value on a variant axis, e.g. "Red" on "Color"
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "variant_values")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub variant_type_id: Uuid,

    #[validate(length(
        min = 1,
        max = 64,
        message = "Variant value must be between 1 and 64 characters"
    ))]
    pub value: String,

    /// Derived from the type name and the value, e.g. `color--red`
    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 260, message = "Variant value slug must be 1 to 260 characters"))]
    pub slug: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::variant_type::Entity",
        from = "Column::VariantTypeId",
        to = "super::variant_type::Column::Id",
        on_delete = "Cascade"
    )]
    VariantType,
    #[sea_orm(has_many = "super::product_variant::Entity")]
    ProductVariants,
}

impl Related<super::variant_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VariantType.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariants.def()
    }
}

/// Slug for `value` on the axis `variant_type_id`, looked up through `db`.
pub(crate) async fn derive_slug<C>(db: &C, variant_type_id: Uuid, value: &str) -> Result<String, DbErr>
where
    C: ConnectionTrait,
{
    let variant_type = super::variant_type::Entity::find_by_id(variant_type_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("Variant type with ID {} not found", variant_type_id))
        })?;
    Ok(slugify_parts(&[&variant_type.name, value]))
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
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        let type_id = match &active_model.variant_type_id {
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(*id),
            ActiveValue::NotSet => None,
        };
        active_model.slug = match (type_id, active_str(&active_model.value)) {
            (Some(type_id), Some(value)) => Set(derive_slug(db, type_id, value).await?),
            _ => ActiveValue::NotSet,
        };

        if let Ok(model) = Model::try_from(active_model.clone()) {
            super::validate_model(&model)?;
        }

        Ok(active_model)
    }
}
