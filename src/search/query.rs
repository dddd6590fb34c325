//! Free-text query parsing.
//!
//! Turns a customer search string into a structured intent: a detected
//! vehicle or catalog category, and length / volume / weight thresholds.
//! Parsing never fails; anything unrecognized stays in `clean_query` for the
//! substring fallback. The rules are ordered data tables so precedence is
//! auditable rule by rule.
//!
//! Queries are bilingual in practice ("лодка 4м", "boat trailer 350cm"), so
//! the keyword groups carry both Russian and English tokens.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entities::trailer::CatalogCategory;
use crate::search::categories::{DetectedCategory, VehicleCategory};

/// Structured intent extracted from a free-text query. Ephemeral, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub category: Option<DetectedCategory>,
    /// Wanted length, millimeters.
    pub length_mm: Option<i64>,
    /// Wanted cargo volume, cubic meters.
    pub volume_m3: Option<f64>,
    /// Wanted carrying capacity, kilograms.
    pub weight_kg: Option<i64>,
    pub raw_query: String,
    /// Lower-cased remainder after recognized tokens are stripped.
    pub clean_query: String,
}

impl ParsedQuery {
    /// True when at least one structured fact was recognized. When nothing
    /// was, the filter engine falls back to substring matching.
    pub fn has_structured_signal(&self) -> bool {
        self.category.is_some()
            || self.length_mm.is_some()
            || self.volume_m3.is_some()
            || self.weight_kg.is_some()
    }
}

/// Converts a unit-less number to millimeters.
///
/// Deliberate approximation carried over from the storefront: values below
/// 20 are read as meters, below 1000 as centimeters, anything else as
/// millimeters already. Ambiguous for unit-less 20..999 and decimals >= 20;
/// preserved exactly because catalog content depends on the thresholds.
pub(crate) fn normalize_bare_length_mm(value: f64) -> f64 {
    if value < 20.0 {
        value * 1000.0
    } else if value < 1000.0 {
        value * 10.0
    } else {
        value
    }
}

/// Ordered keyword-group table. First match wins; vehicle groups are tested
/// before catalog groups so "лодка" beats "лодочный прицеп" synonyms.
static CATEGORY_RULES: Lazy<Vec<(Regex, DetectedCategory)>> = Lazy::new(|| {
    use CatalogCategory as Cat;
    use DetectedCategory::{Catalog, Vehicle};
    use VehicleCategory as Veh;
    vec![
        (
            Regex::new("лодк|катер|boat|яхт|гидро|пвх|надувн").unwrap(),
            Vehicle(Veh::Boat),
        ),
        (
            Regex::new("снегоход|snowmobile|буран|тайга|atv|utv|вездеход|болотоход|квадр")
                .unwrap(),
            Vehicle(Veh::Snowmobile),
        ),
        (
            Regex::new("мото|motorcycle|bike|байк").unwrap(),
            Vehicle(Veh::Motorcycle),
        ),
        (
            Regex::new(r"авто|машин|\bcar\b|автомобил|эвакуат").unwrap(),
            Vehicle(Veh::Car),
        ),
        (
            Regex::new("груз|cargo|поклаж|тонн").unwrap(),
            Vehicle(Veh::Cargo),
        ),
        (Regex::new("лодочн|водн").unwrap(), Catalog(Cat::Water)),
        (
            Regex::new("фургон|коммерч|будк").unwrap(),
            Catalog(Cat::Commercial),
        ),
        (
            Regex::new("бортов|универсал|общ").unwrap(),
            Catalog(Cat::General),
        ),
    ]
});

/// Volume patterns: "10 куб м", "5 м³", "3 м3", "5 кубов", "10 кубометров".
static VOLUME_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(\d+[.,]?\d*)\s*(?:куб\.?\s*м|м³|м3|кубометр\w*)").unwrap(),
        Regex::new(r"(\d+[.,]?\d*)\s*куб[аов]*(?:\s|$|,|\.)").unwrap(),
    ]
});

/// Weight patterns with their to-kilogram factor.
static WEIGHT_RULES: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(\d+[.,]?\d*)\s*тонн[аы]?").unwrap(), 1000.0),
        (Regex::new(r"(\d+[.,]?\d*)\s*т(?:\s|$|,|\.)").unwrap(), 1000.0),
        (Regex::new(r"(\d+[.,]?\d*)\s*(?:кг|kg)").unwrap(), 1.0),
    ]
});

#[derive(Clone, Copy)]
enum LengthUnit {
    Millimeters,
    Centimeters,
    Meters,
    Bare,
}

/// Length patterns in precedence order: explicit units first (millimeters
/// accept integers only), then the bare-number fallback with the size
/// heuristic. The lone "м" is guarded by a trailing boundary so it does not
/// fire inside other words.
static LENGTH_RULES: Lazy<Vec<(Regex, LengthUnit)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(\d+)\s*(?:мм|миллиметр\w*)").unwrap(),
            LengthUnit::Millimeters,
        ),
        (
            Regex::new(r"(\d+[.,]?\d*)\s*(?:см|сантиметр\w*)").unwrap(),
            LengthUnit::Centimeters,
        ),
        (
            Regex::new(r"(\d+[.,]?\d*)\s*(?:метр\w*|м(?:\s|$|,|\.))").unwrap(),
            LengthUnit::Meters,
        ),
        (
            Regex::new(r"(?:^|\s)(\d+(?:[.,]\d+)?)(?:\s|$)").unwrap(),
            LengthUnit::Bare,
        ),
    ]
});

/// Strip patterns for residual-text cleanup, applied after extraction:
/// number+unit spans, then category keyword spans, then bare decimals.
/// Numbers go first so a keyword rule cannot eat a unit token ("тонны") and
/// strand its number in the residue.
static STRIP_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+[.,]?\d*\s*(?:куб\.?\s*м|м³|м3|кубометр\w*|куб[аов]*(?:\s|$))",
        r"\d+[.,]?\d*\s*(?:тонн[аы]?|т(?:\s|$)|кг|kg)",
        r"\d+[.,]?\d*\s*(?:метр\w*|м(?:\s|$)|см|сантиметр\w*|мм|миллиметр\w*)",
        r"лодк[аиу]?|катер[аы]?|boat|яхт[аы]?|гидро\w*|пвх|надувн\w*",
        r"снегоход[аы]?|snowmobile|буран|тайга|болотоход\w*",
        r"квадр\w*|atv|utv|вездеход[аы]?",
        r"мото\w*|motorcycle|bike|байк[аи]?",
        r"авто\w*|машин[аы]?|\bcar\b|автомобил[ья]?|эвакуат\w*",
        r"груз[аы]?|cargo|поклаж[аи]?|тонн\w*",
        r"лодочн\w*|водн\w*",
        r"фургон[аы]?|коммерч\w*|будк[аи]?",
        r"бортов\w*|универсал\w*|общ\w*",
        r"\d+[.,]\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', ".").parse::<f64>().ok()
}

/// Overwrites a whole regex match with spaces, byte for byte, so later
/// passes see the surrounding text at unchanged offsets.
fn blank_match(text: &mut String, caps: &regex::Captures<'_>) {
    if let Some(m) = caps.get(0) {
        text.replace_range(m.range(), &" ".repeat(m.as_str().len()));
    }
}

/// Parses a search query into a [`ParsedQuery`]. Never fails: unrecognized
/// input yields all-unset fields and a `clean_query` equal to the trimmed,
/// lower-cased input.
pub fn parse(query: &str) -> ParsedQuery {
    let lower = query.trim().to_lowercase();
    let mut result = ParsedQuery {
        category: None,
        length_mm: None,
        volume_m3: None,
        weight_kg: None,
        raw_query: query.to_string(),
        clean_query: lower.clone(),
    };
    // Numbers claimed by the volume and weight passes are blanked out here so
    // the length pass cannot read them a second time.
    let mut unclaimed = lower.clone();

    // 1. Category: first matching keyword group wins.
    for (pattern, category) in CATEGORY_RULES.iter() {
        if pattern.is_match(&lower) {
            result.category = Some(*category);
            break;
        }
    }

    // 2. Volume. A volume hit with no category yet means a cargo query.
    for pattern in VOLUME_RULES.iter() {
        if let Some(caps) = pattern.captures(&lower) {
            if let Some(value) = parse_number(&caps[1]) {
                result.volume_m3 = Some(value);
                result
                    .category
                    .get_or_insert(DetectedCategory::Vehicle(VehicleCategory::Cargo));
                blank_match(&mut unclaimed, &caps);
            }
            break;
        }
    }

    // 3. Weight, tonnes converted to kilograms.
    for (pattern, factor) in WEIGHT_RULES.iter() {
        if let Some(caps) = pattern.captures(&lower) {
            if let Some(value) = parse_number(&caps[1]) {
                result.weight_kg = Some((value * factor).round() as i64);
                result
                    .category
                    .get_or_insert(DetectedCategory::Vehicle(VehicleCategory::Cargo));
                blank_match(&mut unclaimed, &caps);
            }
            break;
        }
    }

    // 4. Length, skipped when a volume was found: bulk-cargo queries state
    //    capacity, and a trailing "3м" there is the body, not the load.
    if result.volume_m3.is_none() {
        for (pattern, unit) in LENGTH_RULES.iter() {
            if let Some(caps) = pattern.captures(&unclaimed) {
                if let Some(value) = parse_number(&caps[1]) {
                    let mm = match unit {
                        LengthUnit::Millimeters => value,
                        LengthUnit::Centimeters => value * 10.0,
                        LengthUnit::Meters => value * 1000.0,
                        LengthUnit::Bare => normalize_bare_length_mm(value),
                    };
                    result.length_mm = Some(mm.round() as i64);
                }
                break;
            }
        }
    }

    // 5. Residual cleanup.
    let mut clean = lower;
    for pattern in STRIP_RULES.iter() {
        clean = pattern.replace_all(&clean, " ").into_owned();
    }
    result.clean_query = clean.split_whitespace().collect::<Vec<_>>().join(" ");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("лодка", VehicleCategory::Boat; "boat ru")]
    #[test_case("катер", VehicleCategory::Boat; "cutter")]
    #[test_case("пвх", VehicleCategory::Boat; "pvc dinghy")]
    #[test_case("снегоход", VehicleCategory::Snowmobile; "snowmobile ru")]
    #[test_case("квадроцикл", VehicleCategory::Snowmobile; "quad")]
    #[test_case("квадр", VehicleCategory::Snowmobile; "quad prefix")]
    #[test_case("вездеход", VehicleCategory::Snowmobile; "all terrain")]
    #[test_case("снегоболотоход", VehicleCategory::Snowmobile; "swamp runner")]
    #[test_case("atv", VehicleCategory::Snowmobile; "atv")]
    #[test_case("utv", VehicleCategory::Snowmobile; "utv")]
    #[test_case("мотоцикл", VehicleCategory::Motorcycle; "motorcycle")]
    #[test_case("авто", VehicleCategory::Car; "car ru")]
    #[test_case("эвакуатор", VehicleCategory::Car; "wrecker feeds car")]
    #[test_case("груз", VehicleCategory::Cargo; "cargo ru")]
    #[test_case("cargo", VehicleCategory::Cargo; "cargo en")]
    fn detects_vehicle_categories(query: &str, expected: VehicleCategory) {
        assert_eq!(
            parse(query).category,
            Some(DetectedCategory::Vehicle(expected))
        );
    }

    #[test_case("лодочный", CatalogCategory::Water; "water catalog")]
    #[test_case("фургон", CatalogCategory::Commercial; "van")]
    #[test_case("бортовой", CatalogCategory::General; "flatbed")]
    #[test_case("универсальный", CatalogCategory::General; "universal")]
    fn detects_catalog_categories(query: &str, expected: CatalogCategory) {
        assert_eq!(
            parse(query).category,
            Some(DetectedCategory::Catalog(expected))
        );
    }

    #[test_case("лодка 4м", 4000; "four meters")]
    #[test_case("катер 3.5м", 3500; "decimal meters")]
    #[test_case("лодка 350см", 3500; "centimeters")]
    #[test_case("техника 3500мм", 3500; "millimeters")]
    #[test_case("лодка 4 метра", 4000; "spelled meters")]
    #[test_case("3.5", 3500; "bare small is meters")]
    #[test_case("350", 3500; "bare mid is centimeters")]
    #[test_case("4000", 4000; "bare large is millimeters")]
    fn detects_length(query: &str, expected_mm: i64) {
        assert_eq!(parse(query).length_mm, Some(expected_mm), "query {query:?}");
    }

    #[test_case("техника 500кг", 500; "kilograms")]
    #[test_case("груз 1.5 тонны", 1500; "decimal tonnes")]
    #[test_case("техника 2т", 2000; "short tonne")]
    fn detects_weight(query: &str, expected_kg: i64) {
        assert_eq!(parse(query).weight_kg, Some(expected_kg));
    }

    #[test_case("фургон 10 куб м", 10.0; "cube meters")]
    #[test_case("прицеп 5 кубов", 5.0; "cubes colloquial")]
    #[test_case("фургон 3 м3", 3.0; "m3 ascii")]
    fn detects_volume(query: &str, expected: f64) {
        assert_eq!(parse(query).volume_m3, Some(expected));
    }

    #[test]
    fn volume_suppresses_length() {
        let parsed = parse("фургон 5 кубов 3");
        assert_eq!(parsed.volume_m3, Some(5.0));
        assert_eq!(parsed.length_mm, None);
    }

    #[test]
    fn volume_without_category_implies_cargo() {
        let parsed = parse("5 кубов");
        assert_eq!(
            parsed.category,
            Some(DetectedCategory::Vehicle(VehicleCategory::Cargo))
        );
    }

    #[test]
    fn weight_without_category_implies_cargo() {
        let parsed = parse("1500 кг");
        assert_eq!(
            parsed.category,
            Some(DetectedCategory::Vehicle(VehicleCategory::Cargo))
        );
    }

    #[test]
    fn weight_number_is_not_reused_as_length() {
        let parsed = parse("500 кг");
        assert_eq!(parsed.weight_kg, Some(500));
        assert_eq!(parsed.length_mm, None);
    }

    #[test]
    fn combined_query_keeps_independent_facts() {
        let parsed = parse("лодка 4м 300кг");
        assert_eq!(
            parsed.category,
            Some(DetectedCategory::Vehicle(VehicleCategory::Boat))
        );
        assert_eq!(parsed.length_mm, Some(4000));
        assert_eq!(parsed.weight_kg, Some(300));
    }

    #[test]
    fn unrecognized_query_survives_as_clean_text() {
        let parsed = parse("BRP Can-Am Maverick X3");
        assert!(!parsed.has_structured_signal());
        assert_eq!(parsed.clean_query, "brp can-am maverick x3");
        assert_eq!(parsed.raw_query, "BRP Can-Am Maverick X3");
    }

    #[test]
    fn recognized_tokens_are_stripped_from_clean_query() {
        let parsed = parse("лодка прогресс 4м");
        assert_eq!(parsed.clean_query, "прогресс");
    }

    #[test]
    fn weight_number_is_stripped_with_its_unit() {
        let parsed = parse("груз 2 тонны");
        assert_eq!(parsed.weight_kg, Some(2000));
        assert_eq!(parsed.clean_query, "");
    }

    #[test]
    fn empty_query_parses_to_nothing() {
        let parsed = parse("   ");
        assert!(!parsed.has_structured_signal());
        assert_eq!(parsed.clean_query, "");
    }

    #[test]
    fn bare_number_heuristic_boundaries() {
        assert_eq!(normalize_bare_length_mm(19.9), 19_900.0);
        assert_eq!(normalize_bare_length_mm(20.0), 200.0);
        assert_eq!(normalize_bare_length_mm(999.0), 9_990.0);
        assert_eq!(normalize_bare_length_mm(1000.0), 1000.0);
    }
}
