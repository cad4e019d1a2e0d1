//! Catalog client queries against the fake catalog: decoding, caching,
//! authorization and error mapping.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use deal_catalog::{CacheTag, CatalogError};
use deal_core::{CategoryId, ProductId, UserId};
use deal_integration_tests::{FakeCatalog, Injected, Seed};

#[tokio::test]
async fn test_products_are_fetched_once_and_shared() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let first = client.get_products().await.unwrap();
    let second = client.clone().get_products().await.unwrap();

    assert_eq!(first.len(), 5);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(catalog.hits("GET /api/products"), 1);
}

#[tokio::test]
async fn test_cached_snapshot_is_stale_until_invalidated() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    client.get_products().await.unwrap();
    catalog.rename_product_remotely("p-1", "Phone XI");

    let cached = client.get_products().await.unwrap();
    assert_eq!(cached[0].title, "Phone X");

    client.invalidate(CacheTag::Products).await;
    let fresh = client.get_products().await.unwrap();
    assert_eq!(fresh[0].title, "Phone XI");
    assert_eq!(catalog.hits("GET /api/products"), 2);
}

#[tokio::test]
async fn test_empty_catalog_is_not_an_error() {
    let catalog = FakeCatalog::spawn(Seed::empty()).await;
    let client = catalog.client();

    assert!(client.get_products().await.unwrap().is_empty());
    assert!(client.get_users().await.unwrap().is_empty());
    assert!(client.get_product_categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_records() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let product = client.get_product(&ProductId::new("p-3")).await.unwrap();
    assert_eq!(product.title, "Earbuds");
    assert_eq!(product.categories.len(), 2);
    client.get_product(&ProductId::new("p-3")).await.unwrap();
    assert_eq!(catalog.hits("GET /api/products/p-3"), 1);

    let category = client
        .get_product_category(&CategoryId::new("c-kitchen"))
        .await
        .unwrap();
    assert_eq!(category.category_name, "Kitchen");
}

#[tokio::test]
async fn test_missing_record_is_not_found() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let err = client.get_product(&ProductId::new("p-404")).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref what) if what == "product p-404"));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_seller_products_use_query_parameter() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let products = client
        .get_seller_products(&UserId::new("u-seller-1"))
        .await
        .unwrap();
    let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p-1", "p-4"]);

    let request = catalog.last_request().unwrap();
    assert_eq!(request.path, "/api/products/seller");
    assert_eq!(request.query.as_deref(), Some("id=u-seller-1"));
}

#[tokio::test]
async fn test_bearer_token_is_sent_when_configured() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;

    catalog.client().get_users().await.unwrap();
    assert_eq!(catalog.last_request().unwrap().authorization, None);

    catalog
        .client_with_token("tok-9f2Kq7Zx")
        .get_users()
        .await
        .unwrap();
    assert_eq!(
        catalog.last_request().unwrap().authorization.as_deref(),
        Some("Bearer tok-9f2Kq7Zx")
    );
}

#[tokio::test]
async fn test_error_envelope_messages_are_kept() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    catalog.fail_next(Injected::Status {
        status: 503,
        errors: vec!["Product service unavailable".to_string()],
    });
    let err = client.get_products().await.unwrap_err();
    assert_eq!(err.to_string(), "Catalog error (503): Product service unavailable");
    assert!(err.is_retryable());

    // The failure was not cached.
    assert_eq!(client.get_products().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_failure_envelope_with_success_status() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    catalog.fail_next(Injected::Envelope {
        status: 400,
        errors: vec!["Invalid filter".to_string()],
    });
    let err = client.get_product_categories().await.unwrap_err();
    assert!(matches!(err, CatalogError::Server { status: 400, .. }));
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    catalog.fail_next(Injected::RateLimited { retry_after: 30 });
    let err = client.get_users().await.unwrap_err();
    assert!(matches!(err, CatalogError::RateLimited(30)));
}

#[tokio::test]
async fn test_malformed_body_is_a_parse_error() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    catalog.fail_next(Injected::Garbage);
    let err = client.get_products().await.unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
    assert!(!err.is_retryable());
}
