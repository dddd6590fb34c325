use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of sellable item a stock row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Trailer,
    Accessory,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Trailer => "trailer",
            ItemType::Accessory => "accessory",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "trailer" => Some(ItemType::Trailer),
            "accessory" => Some(ItemType::Accessory),
            _ => None,
        }
    }
}

/// Per (item, warehouse) stock counters.
///
/// Invariants after every mutation: `available_quantity >= 0`,
/// `reserved_quantity >= 0`, and
/// `available_quantity + reserved_quantity <= quantity`. A row with all
/// counters at zero is a valid terminal state and is never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub item_id: Uuid,
    /// String-backed [`ItemType`].
    pub item_type: String,
    pub warehouse_id: Uuid,
    /// Physical count present at the warehouse.
    pub quantity: i64,
    /// Quantity minus reservations and damage holds.
    pub available_quantity: i64,
    /// Held for pending orders.
    pub reserved_quantity: i64,
    /// Incoming, not yet receivable as available.
    pub in_transit: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

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
