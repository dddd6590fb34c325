//! Catalog read-side tests: smart search over seeded trailers and
//! city-scoped availability resolution.

mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use trailstock::config::{SearchConfig, StockSettings};
use trailstock::entities::stock_record::ItemType;
use trailstock::entities::trailer::{self, CatalogCategory};
use trailstock::entities::accessory;
use trailstock::search::TrailerFilters;
use trailstock::services::{CatalogService, StockLedgerService};
use trailstock::stock::AvailabilityStatus;
use uuid::Uuid;

async fn catalog() -> (CatalogService, StockLedgerService, Arc<sea_orm::DatabaseConnection>) {
    let db = Arc::new(common::setup_db().await);
    let ledger = StockLedgerService::new(db.clone(), None);
    let catalog = CatalogService::new(
        db.clone(),
        ledger.clone(),
        SearchConfig::default(),
        StockSettings::default(),
    );
    (catalog, ledger, db)
}

fn query(q: &str) -> TrailerFilters {
    TrailerFilters {
        search_query: Some(q.to_string()),
        ..TrailerFilters::default()
    }
}

#[tokio::test]
async fn boat_query_restricts_to_fitting_water_trailers() {
    let (catalog, _, db) = catalog().await;

    let mut small = trailer::ActiveModel {
        name: Set("МЗСА 3.6".to_string()),
        model: Set("МЗСА 3.6".to_string()),
        category: Set(CatalogCategory::Water.as_str().to_string()),
        price: Set(dec!(120_000)),
        is_visible: Set(true),
        ..Default::default()
    };
    small.specs = Set(Some(serde_json::json!({ "dlina_sudna": "3600 мм" })));
    small.insert(db.as_ref()).await.unwrap();

    let mut big = trailer::ActiveModel {
        name: Set("МЗСА 4.5".to_string()),
        model: Set("МЗСА 4.5".to_string()),
        category: Set(CatalogCategory::Water.as_str().to_string()),
        price: Set(dec!(150_000)),
        is_visible: Set(true),
        ..Default::default()
    };
    big.specs = Set(Some(serde_json::json!({ "dlina_sudna": "4500 мм" })));
    big.insert(db.as_ref()).await.unwrap();

    common::seed_trailer(&db, "Бортовой", CatalogCategory::General, dec!(80_000)).await;

    let found = catalog.search_trailers(&query("лодка 4м")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "МЗСА 4.5");
}

#[tokio::test]
async fn hidden_trailers_never_surface() {
    let (catalog, _, db) = catalog().await;
    let mut hidden = trailer::ActiveModel {
        name: Set("Скрытый".to_string()),
        model: Set("Скрытый".to_string()),
        category: Set(CatalogCategory::General.as_str().to_string()),
        price: Set(dec!(100_000)),
        is_visible: Set(false),
        ..Default::default()
    };
    hidden.insert(db.as_ref()).await.unwrap();

    let found = catalog
        .search_trailers(&TrailerFilters::default())
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn availability_distinguishes_no_data_from_sellout() {
    let (catalog, ledger, db) = catalog().await;
    let wh = common::seed_warehouse(&db, "Центральный", "Сургут", "main").await;
    let never_stocked = Uuid::new_v4();
    let sold_out = Uuid::new_v4();

    ledger
        .receive(sold_out, ItemType::Trailer, wh.id, 1, false)
        .await
        .unwrap();
    ledger
        .reserve(sold_out, ItemType::Trailer, Some(wh.id), 1, None, None)
        .await
        .unwrap();

    let no_data = catalog
        .availability_for(never_stocked, ItemType::Trailer, "Сургут")
        .await
        .unwrap();
    assert_eq!(no_data.status, AvailabilityStatus::NoData);
    assert_eq!(no_data.delivery_days, None);

    let sellout = catalog
        .availability_for(sold_out, ItemType::Trailer, "Сургут")
        .await
        .unwrap();
    assert_eq!(sellout.status, AvailabilityStatus::OnOrder);
    assert_eq!(sellout.delivery_days, None);
}

#[tokio::test]
async fn availability_is_scoped_to_the_customer_city() {
    let (catalog, ledger, db) = catalog().await;
    let local = common::seed_warehouse(&db, "Центральный", "Сургут", "main").await;
    let remote = common::seed_warehouse(&db, "Северный", "Ноябрьск", "regional").await;
    let item = Uuid::new_v4();
    ledger
        .receive(item, ItemType::Trailer, local.id, 2, false)
        .await
        .unwrap();
    ledger
        .receive(item, ItemType::Trailer, remote.id, 3, false)
        .await
        .unwrap();

    let here = catalog
        .availability_for(item, ItemType::Trailer, "г. Сургут")
        .await
        .unwrap();
    assert_eq!(here.status, AvailabilityStatus::InStock);
    assert!(here.is_local_stock);
    assert_eq!(here.local_quantity, 2);
    assert_eq!(here.other_cities_quantity, 3);

    let elsewhere = catalog
        .availability_for(item, ItemType::Trailer, "Нижневартовск")
        .await
        .unwrap();
    assert_eq!(elsewhere.status, AvailabilityStatus::FromOtherCity);
    assert!(!elsewhere.is_local_stock);
    assert_eq!(elsewhere.other_cities_quantity, 5);
}

#[tokio::test]
async fn accessories_filter_by_compatibility() {
    let (catalog, _, db) = catalog().await;
    let t = common::seed_trailer(&db, "МЗСА", CatalogCategory::General, dec!(90_000)).await;
    let other = Uuid::new_v4();

    accessory::ActiveModel {
        name: Set("Тент универсальный".to_string()),
        price: Set(dec!(5_000)),
        compatible_with: Set(serde_json::json!("all")),
        is_visible: Set(true),
        ..Default::default()
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    accessory::ActiveModel {
        name: Set("Крепление для другой модели".to_string()),
        price: Set(dec!(3_000)),
        compatible_with: Set(serde_json::json!([other.to_string()])),
        is_visible: Set(true),
        ..Default::default()
    }
    .insert(db.as_ref())
    .await
    .unwrap();

    let fitting = catalog.accessories_for_trailer(t.id).await.unwrap();
    assert_eq!(fitting.len(), 1);
    assert_eq!(fitting[0].name, "Тент универсальный");
}
