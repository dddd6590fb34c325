use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Warehouse classification, ordered by reservation priority: the main
/// warehouse is drawn from first, partner stock last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarehouseKind {
    Main,
    Regional,
    Partner,
}

impl WarehouseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseKind::Main => "main",
            WarehouseKind::Regional => "regional",
            WarehouseKind::Partner => "partner",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "main" => Some(WarehouseKind::Main),
            "regional" => Some(WarehouseKind::Regional),
            "partner" => Some(WarehouseKind::Partner),
            _ => None,
        }
    }

    /// Lower value wins when choosing a warehouse for a reservation.
    pub fn priority(&self) -> u8 {
        match self {
            WarehouseKind::Main => 1,
            WarehouseKind::Regional => 2,
            WarehouseKind::Partner => 3,
        }
    }
}

/// A physical stock location.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "warehouses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub region: String,
    /// String-backed [`WarehouseKind`].
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn warehouse_kind(&self) -> Option<WarehouseKind> {
        WarehouseKind::from_str(&self.kind)
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_priority_ordering() {
        assert!(WarehouseKind::Main.priority() < WarehouseKind::Regional.priority());
        assert!(WarehouseKind::Regional.priority() < WarehouseKind::Partner.priority());
        assert_eq!(WarehouseKind::from_str("main"), Some(WarehouseKind::Main));
        assert_eq!(WarehouseKind::from_str("depot"), None);
    }
}
