mod common;

use assert_matches::assert_matches;
use async_trait::async_trait;
use product_catalog::{
    entities::Manufacturer,
    media::{LocalMediaStorage, MediaError, MediaStorage, UploadTo},
    services::ManufacturerService,
    ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;

/// Stores files normally, then deletes every manufacturer row so the
/// following row update fails.
struct RowDroppingStorage {
    inner: LocalMediaStorage,
    db: Arc<DatabaseConnection>,
}

#[async_trait]
impl MediaStorage for RowDroppingStorage {
    async fn save(&self, upload_to: UploadTo, filename: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let stored = self.inner.save(upload_to, filename, bytes).await?;
        Manufacturer::delete_many()
            .exec(&*self.db)
            .await
            .expect("delete manufacturers");
        Ok(stored)
    }

    async fn delete(&self, path: &str) -> Result<(), MediaError> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool, MediaError> {
        self.inner.exists(path).await
    }
}

#[tokio::test]
async fn saving_the_same_name_twice_keeps_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalMediaStorage::new(dir.path());

    let first = storage.save(UploadTo::BrandLogo, "logo.png", b"one").await.unwrap();
    let second = storage.save(UploadTo::BrandLogo, "logo.png", b"two").await.unwrap();

    assert_eq!(first, "product/brand_logo/logo.png");
    assert_ne!(first, second);
    assert!(second.starts_with("product/brand_logo/logo_"));
    assert!(second.ends_with(".png"));

    let first_bytes = tokio::fs::read(dir.path().join(&first)).await.unwrap();
    let second_bytes = tokio::fs::read(dir.path().join(&second)).await.unwrap();
    assert_eq!(first_bytes, b"one");
    assert_eq!(second_bytes, b"two");
}

#[tokio::test]
async fn delete_is_idempotent_and_paths_cannot_escape() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalMediaStorage::new(dir.path());

    let path = storage.save(UploadTo::ProductImages, "a b.jpg", b"jpg").await.unwrap();
    assert_eq!(path, "product/images/a_b.jpg");
    assert!(storage.exists(&path).await.unwrap());

    storage.delete(&path).await.unwrap();
    storage.delete(&path).await.unwrap();
    assert!(!storage.exists(&path).await.unwrap());

    assert_matches!(storage.delete("../outside.txt").await, Err(MediaError::InvalidPath(_)));
}

#[tokio::test]
async fn replacing_a_logo_removes_the_old_file() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;

    let first = app
        .services
        .manufacturers
        .set_logo(acme.id, "acme.png", b"v1")
        .await
        .unwrap();
    let old_path = first.logo.clone().unwrap();
    assert!(old_path.starts_with("product/manufacturer_logo/"));
    assert!(app.storage.exists(&old_path).await.unwrap());

    let second = app
        .services
        .manufacturers
        .set_logo(acme.id, "acme-v2.png", b"v2")
        .await
        .unwrap();
    let new_path = second.logo.clone().unwrap();
    assert!(app.storage.exists(&new_path).await.unwrap());
    assert!(!app.storage.exists(&old_path).await.unwrap());

    let cleared = app.services.manufacturers.clear_logo(acme.id).await.unwrap();
    assert_eq!(cleared.logo, None);
    assert!(!app.storage.exists(&new_path).await.unwrap());
}

#[tokio::test]
async fn category_logo_and_icon_use_their_own_directories() {
    let app = common::TestCatalog::new().await;
    let shoes = app.category("Shoes", None).await;

    let with_logo = app
        .services
        .categories
        .set_logo(shoes.id, "shoes.png", b"logo")
        .await
        .unwrap();
    let with_icon = app
        .services
        .categories
        .set_icon(shoes.id, "shoes.svg", b"<svg/>")
        .await
        .unwrap();

    assert_eq!(with_logo.logo.as_deref(), Some("product/category_logo/shoes.png"));
    assert_eq!(with_icon.icon.as_deref(), Some("product/category_icon/shoes.svg"));
    assert_eq!(with_icon.logo, with_logo.logo);
}

#[tokio::test]
async fn product_images_are_stored_and_removed() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;
    let brand = app.brand(acme.id, "Acme Apparel").await;
    let tee = app.product(&brand, "Classic Tee", dec!(19.99)).await;

    let front = app
        .services
        .products
        .add_image(tee.id, "front.png", b"front")
        .await
        .unwrap();
    let back = app
        .services
        .products
        .add_image(tee.id, "back.png", b"back")
        .await
        .unwrap();
    assert_eq!(front.image, "product/images/front.png");
    assert_eq!(app.services.products.list_images(tee.id).await.unwrap().len(), 2);

    app.services.products.delete_image(front.id).await.unwrap();
    assert!(!app.storage.exists(&front.image).await.unwrap());
    assert!(app.storage.exists(&back.image).await.unwrap());

    let remaining = app.services.products.list_images(tee.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, back.id);
}

#[tokio::test]
async fn media_for_missing_rows_is_not_written() {
    let app = common::TestCatalog::new().await;
    let missing = uuid::Uuid::new_v4();

    assert_matches!(
        app.services.products.add_image(missing, "x.png", b"x").await,
        Err(ServiceError::NotFound(_))
    );
    assert!(!app.storage.exists("product/images/x.png").await.unwrap());

    assert_matches!(
        app.services.brands.set_logo(missing, "x.png", b"x").await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn unusable_filenames_are_validation_errors() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;

    assert_matches!(
        app.services.manufacturers.set_logo(acme.id, "???", b"x").await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn brand_and_category_media_can_be_cleared() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;
    let brand = app.brand(acme.id, "Acme Apparel").await;
    let shoes = app.category("Shoes", None).await;

    let brand_logo = app
        .services
        .brands
        .set_logo(brand.id, "apparel.png", b"logo")
        .await
        .unwrap()
        .logo
        .unwrap();
    let cleared = app.services.brands.clear_logo(brand.id).await.unwrap();
    assert_eq!(cleared.logo, None);
    assert!(!app.storage.exists(&brand_logo).await.unwrap());

    app.services
        .categories
        .set_logo(shoes.id, "shoes.png", b"logo")
        .await
        .unwrap();
    let with_both = app
        .services
        .categories
        .set_icon(shoes.id, "shoes.svg", b"<svg/>")
        .await
        .unwrap();
    let category_logo = with_both.logo.clone().unwrap();
    let category_icon = with_both.icon.clone().unwrap();

    let without_icon = app.services.categories.clear_icon(shoes.id).await.unwrap();
    assert_eq!(without_icon.icon, None);
    assert_eq!(without_icon.logo.as_deref(), Some(category_logo.as_str()));
    assert!(!app.storage.exists(&category_icon).await.unwrap());
    assert!(app.storage.exists(&category_logo).await.unwrap());

    let bare = app.services.categories.clear_logo(shoes.id).await.unwrap();
    assert_eq!(bare.logo, None);
    assert!(!app.storage.exists(&category_logo).await.unwrap());
}

#[tokio::test]
async fn failed_logo_update_discards_the_new_file() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;

    let storage = RowDroppingStorage {
        inner: LocalMediaStorage::new(app.storage.root()),
        db: app.db.clone(),
    };
    let manufacturers = ManufacturerService::new(app.db.clone(), Arc::new(storage));

    let result = manufacturers.set_logo(acme.id, "acme.png", b"logo").await;
    assert!(result.is_err());
    assert!(!app
        .storage
        .exists("product/manufacturer_logo/acme.png")
        .await
        .unwrap());
}
