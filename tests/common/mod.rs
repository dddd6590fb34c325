//! Shared fixtures for integration tests: an in-memory SQLite database with
//! the schema derived from the entities, plus seed helpers.
#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, Set,
};
use trailstock::entities::trailer::CatalogCategory;
use trailstock::entities::{accessory, stock_movement, stock_record, trailer, warehouse};
use uuid::Uuid;

/// Single-connection in-memory database so concurrent tasks serialize on the
/// pool instead of each getting a private empty database.
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1);
    let db = Database::connect(opts).await.expect("connect sqlite");

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    for stmt in [
        schema.create_table_from_entity(trailer::Entity),
        schema.create_table_from_entity(accessory::Entity),
        schema.create_table_from_entity(warehouse::Entity),
        schema.create_table_from_entity(stock_record::Entity),
        schema.create_table_from_entity(stock_movement::Entity),
    ] {
        db.execute(backend.build(&stmt)).await.expect("create table");
    }
    db
}

pub async fn seed_warehouse(
    db: &DatabaseConnection,
    name: &str,
    city: &str,
    kind: &str,
) -> warehouse::Model {
    warehouse::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        city: Set(city.to_string()),
        region: Set("ХМАО".to_string()),
        kind: Set(kind.to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("insert warehouse")
}

pub async fn seed_trailer(
    db: &DatabaseConnection,
    name: &str,
    category: CatalogCategory,
    price: Decimal,
) -> trailer::Model {
    trailer::ActiveModel {
        name: Set(name.to_string()),
        model: Set(name.to_string()),
        category: Set(category.as_str().to_string()),
        price: Set(price),
        is_visible: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert trailer")
}
