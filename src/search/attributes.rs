//! Attribute resolution over heterogeneous trailer records.
//!
//! Catalog rows come from several historical sources: typed columns, the
//! `specs` bag of transliterated 1C keys, and scraped composite strings.
//! Each resolver walks an ordered fallback chain (typed column, then specs
//! key, then legacy string) and returns `Option`: absence stays absence, it
//! never collapses to zero or a panic. The filter engine decides what an
//! unknown attribute means for each predicate.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::entities::trailer::Model as Trailer;
use crate::search::query::normalize_bare_length_mm;

/// Parsed `L×W` or `L×W×H` composite string, millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyDimensions {
    pub length_mm: i64,
    pub width_mm: i64,
    pub height_mm: Option<i64>,
}

impl BodyDimensions {
    /// Longest side, used when matching a boat hull against an open frame.
    pub fn longest_mm(&self) -> i64 {
        self.length_mm
            .max(self.width_mm)
            .max(self.height_mm.unwrap_or(0))
    }

    pub fn floor_area_m2(&self) -> f64 {
        self.length_mm as f64 * self.width_mm as f64 / 1e6
    }

    pub fn volume_m3(&self) -> Option<f64> {
        self.height_mm
            .map(|h| self.length_mm as f64 * self.width_mm as f64 * h as f64 / 1e9)
    }
}

// Composite dimension strings appear with Latin and Cyrillic separators:
// "2000x1200", "2.3×1.3", "2000х1200х400 мм", "2000*1200*400".
static DIMENSIONS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d+(?:[.,]\d+)?)\s*[x×хХX*]\s*(\d+(?:[.,]\d+)?)(?:\s*[x×хХX*]\s*(\d+(?:[.,]\d+)?))?",
    )
    .unwrap()
});

static FIRST_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").unwrap());

static LEADING_INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)").unwrap());

fn parse_component(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

/// Parses a composite `L×W(×H)` string. Components without units are pushed
/// through the same meters/centimeters/millimeters heuristic the query parser
/// uses, so "2.3x1.3" and "2300х1300" resolve identically.
pub fn parse_dimension_string(raw: &str) -> Option<BodyDimensions> {
    let caps = DIMENSIONS_RE.captures(raw)?;
    let length = normalize_bare_length_mm(parse_component(&caps[1])?);
    let width = normalize_bare_length_mm(parse_component(&caps[2])?);
    let height = caps
        .get(3)
        .and_then(|m| parse_component(m.as_str()))
        .map(normalize_bare_length_mm);
    Some(BodyDimensions {
        length_mm: length.round() as i64,
        width_mm: width.round() as i64,
        height_mm: height.map(|h| h.round() as i64),
    })
}

/// First number in a free-form length string ("4300 мм мм судно", "4,3 м"),
/// normalized to millimeters. `None` when the string holds no number.
pub fn parse_length_mm(raw: &str) -> Option<i64> {
    let caps = FIRST_NUMBER_RE.captures(raw)?;
    let value = parse_component(&caps[1])?;
    if value <= 0.0 {
        return None;
    }
    Some(normalize_bare_length_mm(value).round() as i64)
}

fn spec_value<'a>(trailer: &'a Trailer, key: &str) -> Option<&'a Value> {
    trailer.specs.as_ref()?.get(key)
}

fn spec_str<'a>(trailer: &'a Trailer, key: &str) -> Option<&'a str> {
    spec_value(trailer, key)?.as_str()
}

/// Numeric specs value, tolerating both JSON numbers and strings with a unit
/// suffix ("750 кг", "8,2").
fn spec_number(trailer: &Trailer, key: &str) -> Option<f64> {
    match spec_value(trailer, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => FIRST_NUMBER_RE
            .captures(s)
            .and_then(|caps| parse_component(&caps[1])),
        _ => None,
    }
}

/// Number of axles. The 1C key `kol_vo_osey_kolyos` holds "axles/wheels"
/// pairs like "1/2" or "2/4"; only the leading count matters.
pub fn axle_count(trailer: &Trailer) -> Option<i16> {
    if let Some(n) = trailer.axle_count {
        return Some(n);
    }
    if let Some(raw) = spec_str(trailer, "kol_vo_osey_kolyos") {
        if let Some(caps) = LEADING_INT_RE.captures(raw) {
            if let Ok(n) = caps[1].parse::<i16>() {
                return Some(n);
            }
        }
    }
    spec_number(trailer, "axles")
        .filter(|n| *n > 0.0)
        .map(|n| n.round() as i16)
}

/// Tri-state brake presence. Unknown is `None`, not `false`: a missing
/// record must not satisfy a "without brakes" filter.
pub fn has_brakes(trailer: &Trailer) -> Option<bool> {
    if let Some(flag) = trailer.has_brakes {
        return Some(flag);
    }
    if let Some(raw) = spec_str(trailer, "tormoz") {
        let lower = raw.to_lowercase();
        if lower.contains("без тормоз") || lower.contains("нет") {
            return Some(false);
        }
        if lower.contains("тормоз наката") || lower.contains("есть") {
            return Some(true);
        }
    }
    if let Some(raw) = &trailer.brakes {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_lowercase() != "нет");
        }
    }
    None
}

/// Gross (loaded) weight in kilograms. Drives the over-750-kg brake
/// requirement.
pub fn gross_weight_kg(trailer: &Trailer) -> Option<i64> {
    if let Some(w) = trailer.gross_weight_kg {
        return Some(i64::from(w));
    }
    spec_number(trailer, "weight")
        .filter(|w| *w > 0.0)
        .map(|w| w.round() as i64)
}

/// Carrying capacity in kilograms.
pub fn capacity_kg(trailer: &Trailer) -> Option<i64> {
    if let Some(c) = trailer.capacity_kg {
        return Some(i64::from(c));
    }
    spec_number(trailer, "gruzopodemnost")
        .filter(|c| *c > 0.0)
        .map(|c| c.round() as i64)
}

/// Longest vehicle the trailer accommodates, millimeters.
pub fn max_vehicle_length_mm(trailer: &Trailer) -> Option<i64> {
    if let Some(v) = trailer.max_vehicle_length_mm {
        return Some(i64::from(v));
    }
    if let Some(raw) = spec_str(trailer, "dlina_sudna") {
        if let Some(mm) = parse_length_mm(raw) {
            return Some(mm);
        }
    }
    for raw in [
        trailer.body_dimensions.as_deref(),
        trailer.dimensions.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(dims) = parse_dimension_string(raw) {
            return Some(dims.length_mm);
        }
        if let Some(mm) = parse_length_mm(raw) {
            return Some(mm);
        }
    }
    None
}

/// Enclosed cargo volume in cubic meters: explicit column, then the
/// `objem_kuzova` specs key, then the inner envelope product.
pub fn cargo_volume_m3(trailer: &Trailer) -> Option<f64> {
    if let Some(v) = trailer.max_vehicle_volume_m3 {
        if v > 0.0 {
            return Some(v);
        }
    }
    if let Some(v) = spec_number(trailer, "objem_kuzova") {
        if v > 0.0 {
            return Some(v);
        }
    }
    match (
        trailer.inner_length_mm,
        trailer.inner_width_mm,
        trailer.inner_height_mm,
    ) {
        (Some(l), Some(w), Some(h)) if l > 0 && w > 0 && h > 0 => {
            Some(f64::from(l) * f64::from(w) * f64::from(h) / 1e9)
        }
        _ => None,
    }
}

/// Longest hull the trailer carries, millimeters. Boat records usually carry
/// the `dlina_sudna` specs key; open frames fall back to the longest side of
/// the composite dimension string.
pub fn boat_length_mm(trailer: &Trailer) -> Option<i64> {
    if let Some(raw) = spec_str(trailer, "dlina_sudna") {
        if let Some(mm) = parse_length_mm(raw) {
            return Some(mm);
        }
    }
    if let Some(v) = trailer.max_vehicle_length_mm {
        return Some(i64::from(v));
    }
    for raw in [
        trailer.body_dimensions.as_deref(),
        trailer.dimensions.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(dims) = parse_dimension_string(raw) {
            return Some(dims.longest_mm());
        }
        if let Some(mm) = parse_length_mm(raw) {
            return Some(mm);
        }
    }
    None
}

/// Inner body dimensions: typed columns, then `razmery_kuzova`, then the
/// legacy composite strings.
pub fn body_dimensions(trailer: &Trailer) -> Option<BodyDimensions> {
    if let (Some(l), Some(w)) = (trailer.inner_length_mm, trailer.inner_width_mm) {
        if l > 0 && w > 0 {
            return Some(BodyDimensions {
                length_mm: i64::from(l),
                width_mm: i64::from(w),
                height_mm: trailer.inner_height_mm.filter(|h| *h > 0).map(i64::from),
            });
        }
    }
    if let Some(raw) = spec_str(trailer, "razmery_kuzova") {
        if let Some(dims) = parse_dimension_string(raw) {
            return Some(dims);
        }
    }
    for raw in [
        trailer.body_dimensions.as_deref(),
        trailer.dimensions.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(dims) = parse_dimension_string(raw) {
            return Some(dims);
        }
    }
    None
}
