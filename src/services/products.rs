use crate::{
    entities::{
        category::{self, Entity as Category, Model as CategoryModel},
        product::{self, Entity as Product, Model as ProductModel},
        product_category,
        product_image::{self, Entity as ProductImage, Model as ProductImageModel},
        product_variant::{self, Entity as ProductVariant, Model as ProductVariantModel},
        validate_money, VariantValue,
    },
    errors::ServiceError,
    media::{MediaStorage, UploadTo},
    services::{discard_media, validate_sluggable, variants::resave_product_variants, Page, Paginated},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Product catalog service for products, their categories, variants and images
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    media: Arc<dyn MediaStorage>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<dyn MediaStorage>) -> Self {
        Self { db, media }
    }

    /// Create a new product and link it to `category_ids`
    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateProductInput) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let product = product::ActiveModel {
            manufacturer_id: Set(input.manufacturer_id),
            brand_id: Set(input.brand_id),
            name: Set(input.name),
            description: Set(input.description),
            retail_price: Set(input.retail_price),
            selling_price: Set(input.selling_price),
            stock: Set(input.stock),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        link_categories(&txn, product.id, input.category_ids).await?;

        txn.commit().await?;

        info!(product_id = %product.id, slug = %product.slug, "Created product");
        Ok(product)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found_by_slug("Product", slug))
    }

    /// List products ordered by name
    #[instrument(skip(self))]
    pub async fn list(&self, page: Page) -> Result<Paginated<ProductModel>, ServiceError> {
        let limit = page.limit();
        let paginator = Product::find()
            .order_by_asc(product::Column::Name)
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

    /// Products linked to a category (not including its subcategories)
    #[instrument(skip(self))]
    pub async fn list_by_category(&self, category_id: Uuid) -> Result<Vec<ProductModel>, ServiceError> {
        let category = Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;

        Ok(category
            .find_related(Product)
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_by_brand(&self, brand_id: Uuid) -> Result<Vec<ProductModel>, ServiceError> {
        Ok(Product::find()
            .filter(product::Column::BrandId.eq(brand_id))
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Update an existing product; renaming re-derives its variants' slugs
    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, input: UpdateProductInput) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let current = Product::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        let renamed = input.name.as_ref().is_some_and(|name| *name != current.name);

        let mut active: product::ActiveModel = current.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(manufacturer_id) = input.manufacturer_id {
            active.manufacturer_id = Set(manufacturer_id);
        }
        if let Some(brand_id) = input.brand_id {
            active.brand_id = Set(brand_id);
        }
        if let Some(retail_price) = input.retail_price {
            active.retail_price = Set(retail_price);
        }
        if let Some(selling_price) = input.selling_price {
            active.selling_price = Set(selling_price);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }

        let product = active.update(&txn).await?;
        if renamed {
            resave_product_variants(&txn, product_variant::Column::ProductId, id).await?;
        }

        txn.commit().await?;

        info!(product_id = %id, renamed, "Updated product");
        Ok(product)
    }

    /// Delete a product with its variants, images and category links
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Product", id));
        }
        info!(product_id = %id, "Deleted product");
        Ok(())
    }

    /// Replace the product's category set
    #[instrument(skip(self))]
    pub async fn set_categories(
        &self,
        product_id: Uuid,
        category_ids: Vec<Uuid>,
    ) -> Result<Vec<CategoryModel>, ServiceError> {
        let txn = self.db.begin().await?;

        Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        product_category::Entity::delete_many()
            .filter(product_category::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        link_categories(&txn, product_id, category_ids).await?;

        txn.commit().await?;

        self.categories_of(product_id).await
    }

    /// Link one category; linking twice is a no-op
    #[instrument(skip(self))]
    pub async fn add_category(&self, product_id: Uuid, category_id: Uuid) -> Result<(), ServiceError> {
        let existing = product_category::Entity::find_by_id((product_id, category_id))
            .one(&*self.db)
            .await?;
        if existing.is_none() {
            product_category::ActiveModel {
                product_id: Set(product_id),
                category_id: Set(category_id),
            }
            .insert(&*self.db)
            .await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_category(&self, product_id: Uuid, category_id: Uuid) -> Result<(), ServiceError> {
        product_category::Entity::delete_by_id((product_id, category_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn categories_of(&self, product_id: Uuid) -> Result<Vec<CategoryModel>, ServiceError> {
        let product = self.get(product_id).await?;
        Ok(product
            .find_related(Category)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Create a product variant
    #[instrument(skip(self))]
    pub async fn create_variant(
        &self,
        input: CreateVariantInput,
    ) -> Result<ProductVariantModel, ServiceError> {
        input.validate()?;

        Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::missing_reference("Product", input.product_id))?;
        ensure_variant_value(&*self.db, input.variant_value_id).await?;

        let variant = product_variant::ActiveModel {
            product_id: Set(input.product_id),
            variant_value_id: Set(input.variant_value_id),
            price_override: Set(input.price_override),
            stock: Set(input.stock.unwrap_or(0)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(
            "Created variant {} for product {}",
            variant.id, input.product_id
        );
        Ok(variant)
    }

    #[instrument(skip(self))]
    pub async fn get_variant(&self, id: Uuid) -> Result<ProductVariantModel, ServiceError> {
        ProductVariant::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product variant", id))
    }

    #[instrument(skip(self))]
    pub async fn list_variants(&self, product_id: Uuid) -> Result<Vec<ProductVariantModel>, ServiceError> {
        Ok(ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::Slug)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn update_variant(
        &self,
        id: Uuid,
        input: UpdateVariantInput,
    ) -> Result<ProductVariantModel, ServiceError> {
        input.validate()?;

        let mut active: product_variant::ActiveModel = self.get_variant(id).await?.into();
        if input.clear_price_override {
            active.price_override = Set(None);
        } else if let Some(price) = input.price_override {
            active.price_override = Set(Some(price));
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(variant_value_id) = input.variant_value_id {
            ensure_variant_value(&*self.db, variant_value_id).await?;
            active.variant_value_id = Set(variant_value_id);
        }

        let variant = active.update(&*self.db).await?;
        info!(variant_id = %id, "Updated product variant");
        Ok(variant)
    }

    #[instrument(skip(self))]
    pub async fn delete_variant(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = ProductVariant::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Product variant", id));
        }
        info!(variant_id = %id, "Deleted product variant");
        Ok(())
    }

    /// Effective price of a variant: its override, else the product's retail price
    #[instrument(skip(self))]
    pub async fn variant_price(&self, variant_id: Uuid) -> Result<Decimal, ServiceError> {
        let (variant, product) = ProductVariant::find_by_id(variant_id)
            .find_also_related(Product)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product variant", variant_id))?;
        let product = product.ok_or_else(|| ServiceError::not_found("Product", variant.product_id))?;
        Ok(variant.get_price(&product))
    }

    /// Store an image file and attach it to the product
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn add_image(
        &self,
        product_id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ProductImageModel, ServiceError> {
        self.get(product_id).await?;
        let stored = self.media.save(UploadTo::ProductImages, filename, bytes).await?;

        let inserted = product_image::ActiveModel {
            product_id: Set(product_id),
            image: Set(stored.clone()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await;

        match inserted {
            Ok(image) => {
                info!(image_id = %image.id, path = %image.image, "Added product image");
                Ok(image)
            }
            Err(e) => {
                discard_media(self.media.as_ref(), &stored).await;
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list_images(&self, product_id: Uuid) -> Result<Vec<ProductImageModel>, ServiceError> {
        Ok(ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Remove an image row and its file
    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: Uuid) -> Result<(), ServiceError> {
        let image = ProductImage::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product image", image_id))?;
        let path = image.image.clone();
        image.delete(&*self.db).await?;
        discard_media(self.media.as_ref(), &path).await;
        Ok(())
    }
}

async fn ensure_variant_value<C>(db: &C, id: Uuid) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    VariantValue::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::missing_reference("Variant value", id))?;
    Ok(())
}

async fn link_categories<C>(db: &C, product_id: Uuid, category_ids: Vec<Uuid>) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let unique: BTreeSet<Uuid> = category_ids.into_iter().collect();
    if unique.is_empty() {
        return Ok(());
    }
    let links = unique.into_iter().map(|category_id| product_category::ActiveModel {
        product_id: Set(product_id),
        category_id: Set(category_id),
    });
    product_category::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Input for creating a new product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    pub manufacturer_id: Uuid,
    pub brand_id: Uuid,
    #[validate(length(min = 1, max = 512), custom = "validate_sluggable")]
    pub name: String,
    pub description: String,
    #[validate(custom = "validate_money")]
    pub retail_price: Decimal,
    #[validate(custom = "validate_money")]
    pub selling_price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
}

/// Input for updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    pub manufacturer_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    #[validate(length(min = 1, max = 512), custom = "validate_sluggable")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub retail_price: Option<Decimal>,
    #[validate(custom = "validate_money")]
    pub selling_price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
}

/// Input for creating a product variant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVariantInput {
    pub product_id: Uuid,
    pub variant_value_id: Uuid,
    #[validate(custom = "validate_money")]
    pub price_override: Option<Decimal>,
    /// Defaults to zero
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVariantInput {
    pub variant_value_id: Option<Uuid>,
    #[validate(custom = "validate_money")]
    pub price_override: Option<Decimal>,
    /// Drops the override so the variant follows the product's retail price
    #[serde(default)]
    pub clear_price_override: bool,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
}
