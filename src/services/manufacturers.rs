use crate::{
    entities::manufacturer::{self, Entity as Manufacturer, Model as ManufacturerModel},
    errors::ServiceError,
    media::{MediaStorage, UploadTo},
    services::{discard_media, optional_text, validate_sluggable, Page, Paginated},
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

/// Service for manufacturers and their logos
#[derive(Clone)]
pub struct ManufacturerService {
    db: Arc<DatabaseConnection>,
    media: Arc<dyn MediaStorage>,
}

impl ManufacturerService {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<dyn MediaStorage>) -> Self {
        Self { db, media }
    }

    /// Create a new manufacturer
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateManufacturerInput,
    ) -> Result<ManufacturerModel, ServiceError> {
        input.validate()?;

        let manufacturer = manufacturer::ActiveModel {
            name: Set(input.name),
            description: Set(input.description.and_then(optional_text)),
            logo: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(manufacturer_id = %manufacturer.id, slug = %manufacturer.slug, "Created manufacturer");
        Ok(manufacturer)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ManufacturerModel, ServiceError> {
        Manufacturer::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Manufacturer", id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<ManufacturerModel, ServiceError> {
        Manufacturer::find()
            .filter(manufacturer::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found_by_slug("Manufacturer", slug))
    }

    /// List manufacturers ordered by name
    #[instrument(skip(self))]
    pub async fn list(&self, page: Page) -> Result<Paginated<ManufacturerModel>, ServiceError> {
        let limit = page.limit();
        let paginator = Manufacturer::find()
            .order_by_asc(manufacturer::Column::Name)
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

    /// Update name and/or description; the slug follows the name
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateManufacturerInput,
    ) -> Result<ManufacturerModel, ServiceError> {
        input.validate()?;

        let mut active: manufacturer::ActiveModel = self.get(id).await?.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(optional_text(description));
        }

        let manufacturer = active.update(&*self.db).await?;
        info!(manufacturer_id = %id, "Updated manufacturer");
        Ok(manufacturer)
    }

    /// Delete a manufacturer together with its brands and products
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Manufacturer::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Manufacturer", id));
        }
        info!(manufacturer_id = %id, "Deleted manufacturer");
        Ok(())
    }

    /// Store a new logo and point the manufacturer at it
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn set_logo(
        &self,
        id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ManufacturerModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.logo.clone();
        let stored = self
            .media
            .save(UploadTo::ManufacturerLogo, filename, bytes)
            .await?;

        let mut active: manufacturer::ActiveModel = current.into();
        active.logo = Set(Some(stored.clone()));
        let manufacturer = match active.update(&*self.db).await {
            Ok(manufacturer) => manufacturer,
            Err(e) => {
                discard_media(self.media.as_ref(), &stored).await;
                return Err(e.into());
            }
        };

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(manufacturer)
    }

    #[instrument(skip(self))]
    pub async fn clear_logo(&self, id: Uuid) -> Result<ManufacturerModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.logo.clone();

        let mut active: manufacturer::ActiveModel = current.into();
        active.logo = Set(None);
        let manufacturer = active.update(&*self.db).await?;

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(manufacturer)
    }
}

/// Input for creating a manufacturer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateManufacturerInput {
    #[validate(length(min = 1, max = 256), custom = "validate_sluggable")]
    pub name: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
}

/// Input for updating a manufacturer; a blank description clears it
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateManufacturerInput {
    #[validate(length(min = 1, max = 256), custom = "validate_sluggable")]
    pub name: Option<String>,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
}
