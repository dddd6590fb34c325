use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of quantity change a movement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    /// New stock arriving at a warehouse.
    Receipt,
    /// Stock held for a pending order.
    Reservation,
    /// A reservation returned to the sellable pool.
    Release,
    /// A fulfilled order permanently leaving the warehouse.
    Commit,
    /// Administrative rebalancing between two warehouses.
    Transfer,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "receipt",
            MovementType::Reservation => "reservation",
            MovementType::Release => "release",
            MovementType::Commit => "commit",
            MovementType::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "receipt" => Some(MovementType::Receipt),
            "reservation" => Some(MovementType::Reservation),
            "release" => Some(MovementType::Release),
            "commit" => Some(MovementType::Commit),
            "transfer" => Some(MovementType::Transfer),
            _ => None,
        }
    }
}

/// Append-only audit record of a stock quantity change.
///
/// Written once per ledger transition, never mutated. `source_warehouse_id`
/// and `dest_warehouse_id` are populated depending on the movement type:
/// receipts have only a destination, commits and reservations only a source,
/// transfers both.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// String-backed [`MovementType`].
    pub movement_type: String,
    pub item_id: Uuid,
    pub item_type: String,
    pub source_warehouse_id: Option<Uuid>,
    pub dest_warehouse_id: Option<Uuid>,
    pub quantity: i64,
    /// Order that drove the transition, when there was one.
    pub order_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let mut active = self;
        if insert {
            if let ActiveValue::NotSet = active.id {
                active.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active.created_at {
                active.created_at = Set(Utc::now());
            }
        }
        Ok(active)
    }
}
