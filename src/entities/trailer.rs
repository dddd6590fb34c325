use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed catalog-category set for sellable trailers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogCategory {
    /// Flatbed / universal trailers.
    General,
    /// Boat trailers. Only water-going vehicles may be matched to these.
    Water,
    /// Enclosed / box-van commercial trailers.
    Commercial,
    /// Motorcycle carriers.
    Moto,
    /// Tow-truck / wrecker platforms.
    Wrecker,
}

impl CatalogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogCategory::General => "general",
            CatalogCategory::Water => "water",
            CatalogCategory::Commercial => "commercial",
            CatalogCategory::Moto => "moto",
            CatalogCategory::Wrecker => "wrecker",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "general" => Some(CatalogCategory::General),
            "water" => Some(CatalogCategory::Water),
            "commercial" => Some(CatalogCategory::Commercial),
            "moto" => Some(CatalogCategory::Moto),
            "wrecker" => Some(CatalogCategory::Wrecker),
            _ => None,
        }
    }
}

/// A sellable trailer.
///
/// Records originate from several historical data shapes: flat legacy
/// columns, the `specs` bag of transliterated 1C keys, and scraped composite
/// strings like `dimensions`. Numeric facts are resolved through
/// [`crate::search::attributes`] rather than read directly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trailers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub description: Option<String>,
    /// String-backed [`CatalogCategory`].
    pub category: String,
    pub price: Decimal,

    /// Inner cargo envelope, millimeters.
    pub inner_length_mm: Option<i32>,
    pub inner_width_mm: Option<i32>,
    pub inner_height_mm: Option<i32>,

    /// Legacy composite strings, e.g. "2000x1500x300 мм".
    pub dimensions: Option<String>,
    pub body_dimensions: Option<String>,

    pub capacity_kg: Option<i32>,
    pub gross_weight_kg: Option<i32>,
    pub curb_weight_kg: Option<i32>,

    pub axle_count: Option<i16>,
    pub has_brakes: Option<bool>,
    /// Legacy free-text brake column ("тормоз наката", "Нет", ...).
    pub brakes: Option<String>,

    pub max_vehicle_length_mm: Option<i32>,
    pub max_vehicle_width_mm: Option<i32>,
    pub max_vehicle_volume_m3: Option<f64>,

    /// Free-form compatibility tags ("boat", "atv", "snowmobile", ...).
    pub compatibility_tags: Option<Json>,
    /// Unstructured key/value bag from upstream data sources.
    pub specs: Option<Json>,

    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn catalog_category(&self) -> Option<CatalogCategory> {
        CatalogCategory::from_str(&self.category)
    }
}

// Stock rows reference trailers and accessories polymorphically through
// (item_id, item_type), so no ORM-level relation is declared.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let mut active = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active.id {
                active.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active.created_at {
                active.created_at = Set(now);
            }
        }
        active.updated_at = Set(Some(now));
        Ok(active)
    }
}
