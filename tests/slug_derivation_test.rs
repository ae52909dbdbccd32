mod common;

use product_catalog::{
    entities::{manufacturer, Manufacturer},
    services::{
        categories::UpdateCategoryInput,
        manufacturers::UpdateManufacturerInput,
        products::{CreateVariantInput, UpdateProductInput},
        variants::{UpdateVariantValueInput, VariantTypeInput},
    },
    slug::slugify,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[tokio::test]
async fn every_named_entity_gets_its_slug_on_create() {
    let app = common::TestCatalog::new().await;

    let acme = app.manufacturer("Acme Widgets, Inc.").await;
    assert_eq!(acme.slug, "acme-widgets-inc");

    let brand = app.brand(acme.id, "Road Runner Gear").await;
    assert_eq!(brand.slug, "road-runner-gear");

    let category = app.category("Men's Shoes", None).await;
    assert_eq!(category.slug, "mens-shoes");

    let color = app.variant_type("Color").await;
    assert_eq!(color.slug, "color");

    let red = app.variant_value(color.id, "Dark Red").await;
    assert_eq!(red.slug, "color--dark-red");

    let tee = app.product(&brand, "Classic Tee", dec!(19.99)).await;
    assert_eq!(tee.slug, slugify(&tee.name));
}

#[tokio::test]
async fn slug_follows_name_on_update() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;

    let renamed = app
        .services
        .manufacturers
        .update(
            acme.id,
            UpdateManufacturerInput {
                name: Some("Acme Corporation".to_string()),
                description: None,
            },
        )
        .await
        .expect("rename manufacturer");
    assert_eq!(renamed.slug, "acme-corporation");

    let stored = app
        .services
        .manufacturers
        .get_by_slug("acme-corporation")
        .await
        .expect("lookup by new slug");
    assert_eq!(stored.id, acme.id);
    assert!(app.services.manufacturers.get_by_slug("acme").await.is_err());

    let category = app.category("Shoes", None).await;
    let category = app
        .services
        .categories
        .update(
            category.id,
            UpdateCategoryInput {
                name: Some("Running Shoes".to_string()),
            },
        )
        .await
        .expect("rename category");
    assert_eq!(category.slug, "running-shoes");
}

#[tokio::test]
async fn caller_supplied_slug_is_overwritten() {
    let app = common::TestCatalog::new().await;

    let inserted = manufacturer::ActiveModel {
        name: Set("Globex".to_string()),
        slug: Set("totally-custom".to_string()),
        description: Set(None),
        logo: Set(None),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("insert manufacturer");
    assert_eq!(inserted.slug, "globex");

    let mut active: manufacturer::ActiveModel = inserted.into();
    active.slug = Set("another-custom".to_string());
    let updated = active.update(&*app.db).await.expect("update manufacturer");
    assert_eq!(updated.slug, "globex");

    let stored = Manufacturer::find_by_id(updated.id)
        .one(&*app.db)
        .await
        .expect("query")
        .expect("row");
    assert_eq!(stored.slug, "globex");
}

#[tokio::test]
async fn update_stamps_updated_at_but_keeps_created_at() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;

    let updated = app
        .services
        .manufacturers
        .update(
            acme.id,
            UpdateManufacturerInput {
                name: None,
                description: Some("Anvils and rockets".to_string()),
            },
        )
        .await
        .expect("update description");

    assert_eq!(updated.created_at, acme.created_at);
    assert!(updated.updated_at >= acme.updated_at);
    assert_eq!(updated.description.as_deref(), Some("Anvils and rockets"));
    assert_eq!(updated.slug, "acme");
}

#[tokio::test]
async fn product_variant_slugs_follow_renames() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;
    let brand = app.brand(acme.id, "Acme Apparel").await;
    let tee = app.product(&brand, "Classic Tee", dec!(19.99)).await;
    let color = app.variant_type("Color").await;
    let red = app.variant_value(color.id, "Red").await;

    let variant = app
        .services
        .products
        .create_variant(CreateVariantInput {
            product_id: tee.id,
            variant_value_id: red.id,
            price_override: None,
            stock: None,
        })
        .await
        .expect("create variant");
    assert_eq!(variant.slug, "classic-tee--color--red");

    app.services
        .products
        .update(
            tee.id,
            UpdateProductInput {
                name: Some("Vintage Tee".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("rename product");
    let variant = app.services.products.get_variant(variant.id).await.expect("variant");
    assert_eq!(variant.slug, "vintage-tee--color--red");

    app.services
        .variants
        .rename_type(
            color.id,
            VariantTypeInput {
                name: "Colour".to_string(),
            },
        )
        .await
        .expect("rename type");
    let red = app.services.variants.get_value(red.id).await.expect("value");
    assert_eq!(red.slug, "colour--red");
    let variant = app.services.products.get_variant(variant.id).await.expect("variant");
    assert_eq!(variant.slug, "vintage-tee--colour--red");

    app.services
        .variants
        .update_value(
            red.id,
            UpdateVariantValueInput {
                value: "Crimson".to_string(),
            },
        )
        .await
        .expect("update value");
    let variant = app.services.products.get_variant(variant.id).await.expect("variant");
    assert_eq!(variant.slug, "vintage-tee--colour--crimson");
}

#[tokio::test]
async fn composite_slugs_keep_type_and_value_apart() {
    let app = common::TestCatalog::new().await;
    let size = app.variant_type("Size").await;
    let size_x = app.variant_type("Size X").await;

    let x_large = app.variant_value(size.id, "X Large").await;
    let large = app.variant_value(size_x.id, "Large").await;

    assert_eq!(x_large.slug, "size--x-large");
    assert_eq!(large.slug, "size-x--large");
}

#[tokio::test]
async fn longest_names_of_expanding_characters_fit_their_slug_columns() {
    let app = common::TestCatalog::new().await;

    let category = app.category(&"Æ".repeat(64), None).await;
    assert_eq!(category.slug, "ae".repeat(64));

    let axis = app.variant_type(&"ß".repeat(64)).await;
    assert_eq!(axis.slug.len(), 128);

    let value = app.variant_value(axis.id, &"Œ".repeat(64)).await;
    assert_eq!(value.slug, format!("{}--{}", "ss".repeat(64), "oe".repeat(64)));

    let maker = app.manufacturer(&"æ".repeat(256)).await;
    assert_eq!(maker.slug.len(), 512);
}
