use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Compatibility scope of an accessory.
///
/// Stored as the JSON sentinel string `"all"` (universal) or a non-empty
/// array of trailer ids. The two representations are mutually exclusive and
/// the list form is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Compatibility {
    Universal(UniversalTag),
    Trailers(Vec<Uuid>),
}

/// Serde helper so `"all"` round-trips as a literal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniversalTag {
    #[serde(rename = "all")]
    All,
}

impl Compatibility {
    pub const ALL: Compatibility = Compatibility::Universal(UniversalTag::All);

    pub fn is_universal(&self) -> bool {
        matches!(self, Compatibility::Universal(_))
    }

    pub fn fits(&self, trailer_id: Uuid) -> bool {
        match self {
            Compatibility::Universal(_) => true,
            Compatibility::Trailers(ids) => ids.contains(&trailer_id),
        }
    }

    /// An explicit empty list would be a scoped accessory that fits nothing,
    /// which the catalog never intends.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Compatibility::Trailers(ids) if ids.is_empty() => {
                Err("compatible_with list must not be empty; use \"all\" for universal".into())
            }
            _ => Ok(()),
        }
    }
}

/// A sellable accessory / option.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accessories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// JSON-encoded [`Compatibility`].
    pub compatible_with: Json,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn compatibility(&self) -> Option<Compatibility> {
        serde_json::from_value(self.compatible_with.clone()).ok()
    }

    /// True when the accessory fits the given trailer. An unreadable
    /// `compatible_with` column is treated as not fitting anything.
    pub fn fits(&self, trailer_id: Uuid) -> bool {
        self.compatibility()
            .map(|c| c.fits(trailer_id))
            .unwrap_or(false)
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
    fn universal_sentinel_round_trips() {
        let c: Compatibility = serde_json::from_str("\"all\"").unwrap();
        assert!(c.is_universal());
        assert!(c.fits(Uuid::new_v4()));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"all\"");
    }

    #[test]
    fn scoped_list_checks_membership() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c: Compatibility =
            serde_json::from_value(serde_json::json!([a.to_string()])).unwrap();
        assert!(!c.is_universal());
        assert!(c.fits(a));
        assert!(!c.fits(b));
    }

    #[test]
    fn empty_list_is_rejected() {
        let c = Compatibility::Trailers(vec![]);
        assert!(c.validate().is_err());
        assert!(Compatibility::ALL.validate().is_ok());
    }
}
