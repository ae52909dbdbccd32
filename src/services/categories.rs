use crate::{
    entities::category::{self, Entity as Category, Model as CategoryModel},
    errors::ServiceError,
    media::{MediaStorage, UploadTo},
    services::{discard_media, validate_sluggable, Page, Paginated},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Service for the category tree
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    media: Arc<dyn MediaStorage>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<dyn MediaStorage>) -> Self {
        Self { db, media }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateCategoryInput) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        let category = category::ActiveModel {
            name: Set(input.name),
            parent_id: Set(input.parent_id),
            logo: Set(None),
            icon: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = %category.id, parent_id = ?category.parent_id, "Created category");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryModel, ServiceError> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found_by_slug("Category", slug))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: Page) -> Result<Paginated<CategoryModel>, ServiceError> {
        let limit = page.limit();
        let paginator = Category::find()
            .order_by_asc(category::Column::Name)
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

    /// Direct children of a category
    #[instrument(skip(self))]
    pub async fn subcategories(&self, id: Uuid) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .filter(category::Column::ParentId.eq(id))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Categories without a parent
    #[instrument(skip(self))]
    pub async fn roots(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .filter(category::Column::ParentId.is_null())
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Parent chain from the direct parent up to the root
    #[instrument(skip(self))]
    pub async fn ancestors(&self, id: Uuid) -> Result<Vec<CategoryModel>, ServiceError> {
        let start = self.get(id).await?;
        parent_chain(&*self.db, start.parent_id, false).await
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        let mut active: category::ActiveModel = self.get(id).await?.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }

        let category = active.update(&*self.db).await?;
        info!(category_id = %id, "Updated category");
        Ok(category)
    }

    /// Move a category under `parent_id`, or make it a root with `None`.
    ///
    /// Fails with `InvalidOperation` when the new parent is the category itself
    /// or one of its descendants.
    #[instrument(skip(self))]
    pub async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<CategoryModel, ServiceError> {
        let txn = self.db.begin().await?;

        let current = Category::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;

        if let Some(parent_id) = parent_id {
            if parent_id == id {
                return Err(ServiceError::InvalidOperation(
                    "a category cannot be its own parent".to_string(),
                ));
            }
            // Locking the new parent's chain serialises moves that touch the same branch.
            let above = parent_chain(&txn, Some(parent_id), true).await?;
            if above.iter().any(|c| c.id == id) {
                return Err(ServiceError::InvalidOperation(format!(
                    "category {} is a descendant of {}",
                    parent_id, id
                )));
            }
        }

        let mut active: category::ActiveModel = current.into();
        active.parent_id = Set(parent_id);
        let category = active.update(&txn).await?;

        txn.commit().await?;

        info!(category_id = %id, parent_id = ?parent_id, "Moved category");
        Ok(category)
    }

    /// Delete a category; its children become roots
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Category::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Category", id));
        }
        info!(category_id = %id, "Deleted category");
        Ok(())
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn set_logo(
        &self,
        id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<CategoryModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.logo.clone();
        let stored = self.media.save(UploadTo::CategoryLogo, filename, bytes).await?;

        let mut active: category::ActiveModel = current.into();
        active.logo = Set(Some(stored.clone()));
        let category = match active.update(&*self.db).await {
            Ok(category) => category,
            Err(e) => {
                discard_media(self.media.as_ref(), &stored).await;
                return Err(e.into());
            }
        };

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(category)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn set_icon(
        &self,
        id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<CategoryModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.icon.clone();
        let stored = self.media.save(UploadTo::CategoryIcon, filename, bytes).await?;

        let mut active: category::ActiveModel = current.into();
        active.icon = Set(Some(stored.clone()));
        let category = match active.update(&*self.db).await {
            Ok(category) => category,
            Err(e) => {
                discard_media(self.media.as_ref(), &stored).await;
                return Err(e.into());
            }
        };

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn clear_logo(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.logo.clone();

        let mut active: category::ActiveModel = current.into();
        active.logo = Set(None);
        let category = active.update(&*self.db).await?;

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn clear_icon(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        let current = self.get(id).await?;
        let previous = current.icon.clone();

        let mut active: category::ActiveModel = current.into();
        active.icon = Set(None);
        let category = active.update(&*self.db).await?;

        if let Some(old) = previous {
            discard_media(self.media.as_ref(), &old).await;
        }
        Ok(category)
    }
}

/// Loads `first` and each category above it, nearest first.
///
/// Stops at a repeated ID so a corrupted tree cannot loop forever.
async fn parent_chain<C>(
    db: &C,
    first: Option<Uuid>,
    lock: bool,
) -> Result<Vec<CategoryModel>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut chain: Vec<CategoryModel> = Vec::new();
    let mut seen = HashSet::new();
    let mut next = first;

    while let Some(id) = next {
        if !seen.insert(id) {
            warn!(category_id = %id, "Category tree contains a cycle");
            break;
        }
        let mut query = Category::find_by_id(id);
        if lock {
            query = query.lock_exclusive();
        }
        let category = query
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        next = category.parent_id;
        chain.push(category);
    }

    Ok(chain)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 64), custom = "validate_sluggable")]
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Renames a category; use [`CategoryService::set_parent`] to move it
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 64), custom = "validate_sluggable")]
    pub name: Option<String>,
}
