use crate::{
    entities::brand::{self, Entity as Brand, Model as BrandModel},
    errors::ServiceError,
    media::{MediaStorage, UploadTo},
    services::{discard_media, validate_sluggable, Page, Paginated},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Service for brands
#[derive(Clone)]
pub struct BrandService {
    db: Arc<DatabaseConnection>,
    media: Arc<dyn MediaStorage>,
}

impl BrandService {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<dyn MediaStorage>) -> Self {
        Self { db, media }
    }

    /// Create a brand under an existing manufacturer
    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateBrandInput) -> Result<BrandModel, ServiceError> {
        input.validate()?;

        let brand = brand::ActiveModel {
            manufacturer_id: Set(input.manufacturer_id),
            name: Set(input.name),
            logo: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(brand_id = %brand.id, manufacturer_id = %brand.manufacturer_id, "Created brand");
        Ok(brand)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<BrandModel, ServiceError> {
        Brand::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Brand", id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<BrandModel, ServiceError> {
        Brand::find()
            .filter(brand::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found_by_slug("Brand", slug))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: Page) -> Result<Paginated<BrandModel>, ServiceError> {
        let limit = page.limit();
        let paginator = Brand::find()
            .order_by_asc(brand::Column::Name)
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

    /// All brands of one manufacturer, ordered by name
    #[instrument(skip(self))]
    pub async fn list_by_manufacturer(
        &self,
        manufacturer_id: Uuid,
    ) -> Result<Vec<BrandModel>, ServiceError> {
        Ok(Brand::find()
            .filter(brand::Column::ManufacturerId.eq(manufacturer_id))
            .order_by_asc(brand::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, input: UpdateBrandInput) -> Result<BrandModel, ServiceError> {
        input.validate()?;

        let mut active: brand::ActiveModel = self.get(id).await?.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(manufacturer_id) = input.manufacturer_id {
            active.manufacturer_id = Set(manufacturer_id);
        }

        let brand = active.update(&*self.db).await?;
        info!(brand_id = %id, "Updated brand");
        Ok(brand)
    }

    /// Delete a brand together with its products
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Brand::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Brand", id));
        }
        info!(brand_id = %id, "Deleted brand");
        Ok(())
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn set_logo(
        &self,
        id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<BrandModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.logo.clone();
        let stored = self.media.save(UploadTo::BrandLogo, filename, bytes).await?;

        let mut active: brand::ActiveModel = current.into();
        active.logo = Set(Some(stored.clone()));
        let brand = match active.update(&*self.db).await {
            Ok(brand) => brand,
            Err(e) => {
                discard_media(self.media.as_ref(), &stored).await;
                return Err(e.into());
            }
        };

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(brand)
    }

    #[instrument(skip(self))]
    pub async fn clear_logo(&self, id: Uuid) -> Result<BrandModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.logo.clone();

        let mut active: brand::ActiveModel = current.into();
        active.logo = Set(None);
        let brand = active.update(&*self.db).await?;

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(brand)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBrandInput {
    pub manufacturer_id: Uuid,
    #[validate(length(min = 1, max = 256), custom = "validate_sluggable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBrandInput {
    /// Moves the brand to another manufacturer
    pub manufacturer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 256), custom = "validate_sluggable")]
    pub name: Option<String>,
}
