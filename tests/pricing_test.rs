mod common;

use assert_matches::assert_matches;
use product_catalog::{
    entities::ProductVariant,
    services::products::{CreateVariantInput, UpdateProductInput, UpdateVariantInput},
    ServiceError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

struct Fixture {
    app: common::TestCatalog,
    product_id: uuid::Uuid,
    value_id: uuid::Uuid,
}

async fn fixture() -> Fixture {
    let app = common::TestCatalog::new().await;
    let acme = app.manufacturer("Acme").await;
    let brand = app.brand(acme.id, "Acme Apparel").await;
    let tee = app.product(&brand, "Classic Tee", dec!(19.99)).await;
    let color = app.variant_type("Color").await;
    let red = app.variant_value(color.id, "Red").await;
    Fixture {
        app,
        product_id: tee.id,
        value_id: red.id,
    }
}

impl Fixture {
    async fn variant(&self, price_override: Option<Decimal>) -> uuid::Uuid {
        self.app
            .services
            .products
            .create_variant(CreateVariantInput {
                product_id: self.product_id,
                variant_value_id: self.value_id,
                price_override,
                stock: None,
            })
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn override_price_wins() {
    let f = fixture().await;
    let variant_id = f.variant(Some(dec!(9.99))).await;

    let price = f.app.services.products.variant_price(variant_id).await.unwrap();
    assert_eq!(price.round_dp(2), dec!(9.99));
}

#[tokio::test]
async fn missing_override_follows_retail_price() {
    let f = fixture().await;
    let variant_id = f.variant(None).await;

    let price = f.app.services.products.variant_price(variant_id).await.unwrap();
    assert_eq!(price.round_dp(2), dec!(19.99));

    f.app
        .services
        .products
        .update(
            f.product_id,
            UpdateProductInput {
                retail_price: Some(dec!(24.50)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let price = f.app.services.products.variant_price(variant_id).await.unwrap();
    assert_eq!(price.round_dp(2), dec!(24.50));
}

#[tokio::test]
async fn new_variants_start_with_zero_stock() {
    let f = fixture().await;
    let variant_id = f.variant(None).await;

    let variant = f.app.services.products.get_variant(variant_id).await.unwrap();
    assert_eq!(variant.stock, 0);
    assert_eq!(variant.price_override, None);
}

#[tokio::test]
async fn override_can_be_set_and_cleared() {
    let f = fixture().await;
    let variant_id = f.variant(None).await;

    f.app
        .services
        .products
        .update_variant(
            variant_id,
            UpdateVariantInput {
                price_override: Some(dec!(15.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let price = f.app.services.products.variant_price(variant_id).await.unwrap();
    assert_eq!(price.round_dp(2), dec!(15.00));

    f.app
        .services
        .products
        .update_variant(
            variant_id,
            UpdateVariantInput {
                clear_price_override: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let price = f.app.services.products.variant_price(variant_id).await.unwrap();
    assert_eq!(price.round_dp(2), dec!(19.99));
}

#[tokio::test]
async fn resolve_price_reads_through_the_connection() {
    let f = fixture().await;
    let variant_id = f.variant(None).await;

    let variant = ProductVariant::find_by_id(variant_id)
        .one(&*f.app.db)
        .await
        .unwrap()
        .unwrap();
    let price = variant.resolve_price(&*f.app.db).await.unwrap();
    assert_eq!(price.round_dp(2), dec!(19.99));
}

#[tokio::test]
async fn prices_with_more_than_two_decimals_are_rejected() {
    let f = fixture().await;

    let err = f
        .app
        .services
        .products
        .create_variant(CreateVariantInput {
            product_id: f.product_id,
            variant_value_id: f.value_id,
            price_override: Some(dec!(9.999)),
            stock: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn price_of_missing_variant_is_not_found() {
    let f = fixture().await;
    assert_matches!(
        f.app.services.products.variant_price(uuid::Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
}
