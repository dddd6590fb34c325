//! Vehicle-to-trailer category compatibility.
//!
//! The mapping is a finite table, not scattered conditionals: boats are
//! hard-constrained to water-type trailers (a hull does not sit on a
//! flatbed), while land vehicles are deliberately unrestricted; their fit is
//! expressed through dimension and weight thresholds instead.

use serde::{Deserialize, Serialize};

use crate::entities::trailer::CatalogCategory;

/// Vehicle category detected from a customer query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleCategory {
    Boat,
    Snowmobile,
    Atv,
    Motorcycle,
    Car,
    Cargo,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Boat => "boat",
            VehicleCategory::Snowmobile => "snowmobile",
            VehicleCategory::Atv => "atv",
            VehicleCategory::Motorcycle => "motorcycle",
            VehicleCategory::Car => "car",
            VehicleCategory::Cargo => "cargo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "boat" => Some(VehicleCategory::Boat),
            "snowmobile" => Some(VehicleCategory::Snowmobile),
            "atv" => Some(VehicleCategory::Atv),
            "motorcycle" => Some(VehicleCategory::Motorcycle),
            "car" => Some(VehicleCategory::Car),
            "cargo" => Some(VehicleCategory::Cargo),
            _ => None,
        }
    }

    /// Maps a vehicle category to the trailer catalog category it is allowed
    /// to match, or `None` for "do not restrict by category".
    ///
    /// Boats map hard to water trailers. Every land category returns `None`:
    /// snowmobiles, ATVs, cars and cargo ride on both general and commercial
    /// trailers, and the restriction that matters for them is size and
    /// weight, not catalog taxonomy.
    pub fn trailer_category(&self) -> Option<CatalogCategory> {
        match self {
            VehicleCategory::Boat => Some(CatalogCategory::Water),
            VehicleCategory::Snowmobile
            | VehicleCategory::Atv
            | VehicleCategory::Motorcycle
            | VehicleCategory::Car
            | VehicleCategory::Cargo => None,
        }
    }
}

/// What a search query's category token resolved to: either a kind of
/// vehicle the customer wants to haul, or a catalog category named directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectedCategory {
    Vehicle(VehicleCategory),
    Catalog(CatalogCategory),
}

impl DetectedCategory {
    /// The catalog restriction this detection implies, if any.
    pub fn catalog_restriction(&self) -> Option<CatalogCategory> {
        match self {
            DetectedCategory::Vehicle(v) => v.trailer_category(),
            DetectedCategory::Catalog(c) => Some(*c),
        }
    }

    pub fn vehicle(&self) -> Option<VehicleCategory> {
        match self {
            DetectedCategory::Vehicle(v) => Some(*v),
            DetectedCategory::Catalog(_) => None,
        }
    }
}
