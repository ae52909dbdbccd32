mod common;

use assert_matches::assert_matches;
use product_catalog::{
    entities::{product, product_variant, Product, ProductVariant},
    services::products::{CreateVariantInput, UpdateProductInput, UpdateVariantInput},
    ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set,
};

#[tokio::test]
async fn services_reject_negative_stock() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;
    let brand = app.brand(acme.id, "Acme Apparel").await;

    let mut input = common::product_input(&brand, "Classic Tee", dec!(19.99));
    input.stock = -1;
    assert_matches!(
        app.services.products.create(input).await,
        Err(ServiceError::ValidationError(_))
    );

    let tee = app.product(&brand, "Classic Tee", dec!(19.99)).await;
    let err = app
        .services
        .products
        .update(
            tee.id,
            UpdateProductInput {
                stock: Some(-5),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let color = app.variant_type("Color").await;
    let red = app.variant_value(color.id, "Red").await;
    let err = app
        .services
        .products
        .create_variant(CreateVariantInput {
            product_id: tee.id,
            variant_value_id: red.id,
            price_override: None,
            stock: Some(-1),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let variant = app
        .services
        .products
        .create_variant(CreateVariantInput {
            product_id: tee.id,
            variant_value_id: red.id,
            price_override: None,
            stock: Some(2),
        })
        .await
        .unwrap();
    let err = app
        .services
        .products
        .update_variant(
            variant.id,
            UpdateVariantInput {
                stock: Some(-2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    assert_eq!(app.services.products.get_variant(variant.id).await.unwrap().stock, 2);
}

#[tokio::test]
async fn save_hook_rejects_negative_stock() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;
    let brand = app.brand(acme.id, "Acme Apparel").await;
    let tee = app.product(&brand, "Classic Tee", dec!(19.99)).await;

    let mut active: product::ActiveModel = tee.into();
    active.stock = Set(-3);
    let err = active.update(&*app.db).await.unwrap_err();
    assert_matches!(err, DbErr::Custom(msg) if msg.starts_with("Validation error"));
}

#[tokio::test]
async fn database_check_rejects_negative_stock_that_skips_the_hook() {
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
            stock: Some(1),
        })
        .await
        .unwrap();

    let result = Product::update_many()
        .col_expr(product::Column::Stock, Expr::value(-1))
        .filter(product::Column::Id.eq(tee.id))
        .exec(&*app.db)
        .await;
    assert!(result.is_err());

    let result = ProductVariant::update_many()
        .col_expr(product_variant::Column::Stock, Expr::value(-1))
        .filter(product_variant::Column::Id.eq(variant.id))
        .exec(&*app.db)
        .await;
    assert!(result.is_err());

    assert_eq!(app.services.products.get(tee.id).await.unwrap().stock, 5);
    assert_eq!(app.services.products.get_variant(variant.id).await.unwrap().stock, 1);
}

#[tokio::test]
async fn zero_stock_is_allowed() {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;
    let brand = app.brand(acme.id, "Acme Apparel").await;
    let tee = app.product(&brand, "Classic Tee", dec!(19.99)).await;

    let updated = app
        .services
        .products
        .update(
            tee.id,
            UpdateProductInput {
                stock: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.stock, 0);
}
