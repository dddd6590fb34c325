//! Catalog filtering and sorting.
//!
//! Pure and deterministic: the same trailer slice, filters and configuration
//! always produce the same output. Persistence, visibility scoping and stock
//! lookups stay in the service layer; this module only encodes the matching
//! policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::entities::trailer::{CatalogCategory, Model as Trailer};
use crate::search::attributes;
use crate::search::categories::VehicleCategory;
use crate::search::query::{self, ParsedQuery};

/// Explicit brake predicate from the catalog UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrakeFilter {
    #[default]
    Any,
    /// Only trailers with a confirmed brake installation.
    With,
    /// Only trailers not confirmed to have brakes. Unknown records stay in:
    /// excluding them would hide most of the legacy catalog.
    Without,
}

/// Caller-selected sort order. No option means insertion order is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    PriceAsc,
    PriceDesc,
    AxlesAsc,
    AxlesDesc,
    /// Heaviest gross weight first; the storefront's "brakes first" order.
    GrossWeightDesc,
    LengthDesc,
    AreaDesc,
    VolumeDesc,
    BoatLengthDesc,
    NameAsc,
    NameDesc,
}

/// Catalog filter set. Every field is optional; an empty filter matches
/// every trailer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailerFilters {
    /// Free-text query, run through the query parser.
    pub search_query: Option<String>,
    /// Explicit category picked in the UI, independent of the query.
    pub category: Option<CatalogCategory>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub axles: Option<i16>,
    #[serde(default)]
    pub brakes: BrakeFilter,
    pub sort: Option<SortOption>,
}

/// Applies the filter policy and the requested sort, returning matching
/// trailers. Filter order: category restrictions, parsed size/volume/weight
/// thresholds, free-text fallback, price window, axle and brake predicates.
pub fn filter_and_sort(
    trailers: &[Trailer],
    filters: &TrailerFilters,
    config: &SearchConfig,
) -> Vec<Trailer> {
    let parsed = filters
        .search_query
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .map(query::parse);

    let mut result: Vec<Trailer> = trailers
        .iter()
        .filter(|t| matches(t, filters, parsed.as_ref(), config))
        .cloned()
        .collect();

    if let Some(sort) = filters.sort {
        apply_sort(&mut result, sort);
    }
    result
}

fn matches(
    trailer: &Trailer,
    filters: &TrailerFilters,
    parsed: Option<&ParsedQuery>,
    config: &SearchConfig,
) -> bool {
    let category = trailer.catalog_category();

    if let Some(wanted) = filters.category {
        if category != Some(wanted) {
            return false;
        }
    }

    if let Some(parsed) = parsed {
        if let Some(detected) = parsed.category {
            if let Some(required) = detected.catalog_restriction() {
                if category != Some(required) {
                    return false;
                }
            }
        }

        // Length engages only above the noise threshold: a small parsed
        // number is more likely a model designation than a size request.
        if let Some(length) = parsed.length_mm {
            if length >= config.size_threshold_mm {
                let is_boat_query = parsed
                    .category
                    .and_then(|c| c.vehicle())
                    .map(|v| v == VehicleCategory::Boat)
                    .unwrap_or(false);
                let accommodated = if is_boat_query {
                    attributes::boat_length_mm(trailer)
                } else {
                    attributes::max_vehicle_length_mm(trailer)
                };
                // A record that cannot prove it fits the vehicle does not
                // match a size request.
                match accommodated {
                    Some(mm) if mm >= length => {}
                    _ => return false,
                }
            }
        }

        if let Some(volume) = parsed.volume_m3 {
            match attributes::cargo_volume_m3(trailer) {
                Some(v) if v >= volume => {}
                _ => return false,
            }
        }

        if let Some(weight) = parsed.weight_kg {
            match attributes::capacity_kg(trailer) {
                Some(c) if c >= weight => {}
                _ => return false,
            }
        }

        // Substring fallback only for queries that parsed to nothing; once a
        // structured fact matched, leftover words must not empty the result.
        if !parsed.has_structured_signal() && !parsed.clean_query.is_empty() {
            let needle = &parsed.clean_query;
            let name_hit = trailer.name.to_lowercase().contains(needle);
            let model_hit = trailer.model.to_lowercase().contains(needle);
            if !name_hit && !model_hit {
                return false;
            }
        }
    }

    let min = filters.min_price.unwrap_or(Decimal::ZERO);
    let max = filters
        .max_price
        .unwrap_or_else(|| Decimal::from(config.default_max_price));
    if trailer.price < min || trailer.price > max {
        return false;
    }

    if let Some(wanted_axles) = filters.axles {
        // Unknown axle count never excludes; only a contradicting value does.
        if let Some(axles) = attributes::axle_count(trailer) {
            if axles != wanted_axles {
                return false;
            }
        }
    }

    match filters.brakes {
        BrakeFilter::Any => {}
        BrakeFilter::With => {
            if attributes::has_brakes(trailer) != Some(true) {
                return false;
            }
        }
        BrakeFilter::Without => {
            if attributes::has_brakes(trailer) == Some(true) {
                return false;
            }
        }
    }

    true
}

fn apply_sort(trailers: &mut [Trailer], sort: SortOption) {
    match sort {
        SortOption::PriceAsc => trailers.sort_by(|a, b| a.price.cmp(&b.price)),
        SortOption::PriceDesc => trailers.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOption::AxlesAsc => trailers.sort_by_key(|t| attributes::axle_count(t).unwrap_or(0)),
        SortOption::AxlesDesc => {
            trailers.sort_by_key(|t| std::cmp::Reverse(attributes::axle_count(t).unwrap_or(0)))
        }
        SortOption::GrossWeightDesc => trailers
            .sort_by_key(|t| std::cmp::Reverse(attributes::gross_weight_kg(t).unwrap_or(0))),
        SortOption::LengthDesc => trailers.sort_by_key(|t| {
            std::cmp::Reverse(
                attributes::body_dimensions(t)
                    .map(|d| d.length_mm)
                    .unwrap_or(0),
            )
        }),
        SortOption::AreaDesc => trailers.sort_by(|a, b| {
            let area = |t: &Trailer| {
                attributes::body_dimensions(t)
                    .map(|d| d.floor_area_m2())
                    .unwrap_or(0.0)
            };
            area(b).total_cmp(&area(a))
        }),
        SortOption::VolumeDesc => trailers.sort_by(|a, b| {
            let volume = |t: &Trailer| {
                attributes::body_dimensions(t)
                    .and_then(|d| d.volume_m3())
                    .unwrap_or(0.0)
            };
            volume(b).total_cmp(&volume(a))
        }),
        SortOption::BoatLengthDesc => {
            trailers.sort_by_key(|t| std::cmp::Reverse(attributes::boat_length_mm(t).unwrap_or(0)))
        }
        SortOption::NameAsc => trailers.sort_by(|a, b| a.model.cmp(&b.model)),
        SortOption::NameDesc => trailers.sort_by(|a, b| b.model.cmp(&a.model)),
    }
}
