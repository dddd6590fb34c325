//! Customer-facing availability resolution.
//!
//! Translates an item's aggregated stock into what the storefront shows for
//! one customer city: status, delivery estimate, label and badge. Labels stay
//! Russian because they render verbatim in the shop UI.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{StockDisplayMode, StockSettings};
use crate::stock::aggregate::AggregatedAvailability;

pub const LABEL_IN_STOCK: &str = "В наличии";
pub const LABEL_ON_ORDER: &str = "Под заказ";
pub const LABEL_OUT_OF_STOCK: &str = "Нет в наличии";

pub const BADGE_IN_STOCK: &str = "bg-green-500 text-white";
pub const BADGE_OTHER_CITY: &str = "bg-yellow-500 text-gray-900";
pub const BADGE_ON_ORDER: &str = "bg-gray-200 text-gray-700 dark:bg-gray-600 dark:text-gray-300";
pub const BADGE_NO_DATA: &str = "bg-red-100 text-red-700 dark:bg-red-900 dark:text-red-300";

/// Resolved availability state for one item in one city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// Available in the customer's own city.
    InStock,
    /// Available, but only in another city of the network.
    FromOtherCity,
    /// Known to the stock system and currently sold out; orderable.
    OnOrder,
    /// Never stocked: the item has no rows in the ledger at all. Rendered
    /// distinctly from a sell-out so data gaps do not look orderable.
    NoData,
}

/// Closest warehouse holding the item when it ships from another city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearestStock {
    pub city: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub status: AvailabilityStatus,
    pub is_available: bool,
    pub is_local_stock: bool,
    pub local_quantity: i64,
    pub other_cities_quantity: i64,
    /// Delivery estimate in days ("0-1", "1-4", "14-21"); `None` when there
    /// is nothing to deliver.
    pub delivery_days: Option<String>,
    pub label: String,
    pub badge_class: &'static str,
    pub nearest_city: Option<NearestStock>,
}

static CITY_WORD_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Гг]ород\s+").unwrap());
static CITY_ABBREV_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Гг](?:\.|\s)\s*").unwrap());

/// Canonical city spelling for comparisons: whitespace collapsed, the
/// "г." / "город" prefixes stripped, every word title-cased. "г. сургут",
/// "Город Сургут" and "СУРГУТ" all normalize to "Сургут".
pub fn normalize_city(raw: &str) -> String {
    let collapsed = raw.trim().split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = if CITY_WORD_PREFIX.is_match(&collapsed) {
        CITY_WORD_PREFIX.replace(&collapsed, "").into_owned()
    } else {
        CITY_ABBREV_PREFIX.replace(&collapsed, "").into_owned()
    };
    stripped
        .split(' ')
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Resolves what a customer in `customer_city` sees for this item.
pub fn resolve(
    stock: Option<&AggregatedAvailability>,
    customer_city: &str,
    settings: &StockSettings,
) -> AvailabilityResult {
    let Some(stock) = stock else {
        return no_data();
    };

    let city = normalize_city(customer_city);
    let local_quantity: i64 = stock
        .by_warehouse
        .iter()
        .filter(|w| normalize_city(&w.city) == city)
        .map(|w| w.available)
        .sum();
    let other_cities_quantity: i64 = stock
        .by_warehouse
        .iter()
        .filter(|w| normalize_city(&w.city) != city && w.available > 0)
        .map(|w| w.available)
        .sum();
    let total_available = local_quantity + other_cities_quantity;

    match settings.display_mode {
        StockDisplayMode::Total if total_available > 0 => AvailabilityResult {
            status: AvailabilityStatus::InStock,
            is_available: true,
            is_local_stock: local_quantity > 0,
            local_quantity,
            other_cities_quantity,
            delivery_days: Some(settings.local_delivery_days.clone()),
            label: quantity_label(settings, total_available),
            badge_class: BADGE_IN_STOCK,
            nearest_city: None,
        },
        StockDisplayMode::Hidden => {
            let is_available = total_available > 0;
            AvailabilityResult {
                status: if is_available {
                    AvailabilityStatus::InStock
                } else {
                    AvailabilityStatus::OnOrder
                },
                is_available,
                is_local_stock: local_quantity > 0,
                local_quantity,
                other_cities_quantity,
                delivery_days: is_available.then(|| settings.local_delivery_days.clone()),
                label: if is_available {
                    LABEL_IN_STOCK.to_string()
                } else {
                    LABEL_ON_ORDER.to_string()
                },
                badge_class: if is_available {
                    BADGE_IN_STOCK
                } else {
                    BADGE_ON_ORDER
                },
                nearest_city: None,
            }
        }
        _ if local_quantity > 0 => AvailabilityResult {
            status: AvailabilityStatus::InStock,
            is_available: true,
            is_local_stock: true,
            local_quantity,
            other_cities_quantity,
            delivery_days: Some(settings.local_delivery_days.clone()),
            label: quantity_label(settings, local_quantity),
            badge_class: BADGE_IN_STOCK,
            nearest_city: None,
        },
        _ if other_cities_quantity > 0 => {
            let nearest = nearest_warehouse(stock, &city);
            AvailabilityResult {
                status: AvailabilityStatus::FromOtherCity,
                is_available: true,
                is_local_stock: false,
                local_quantity: 0,
                other_cities_quantity,
                delivery_days: Some(settings.other_city_delivery_days.clone()),
                label: format!("Доставка {} дн.", settings.other_city_delivery_days),
                badge_class: BADGE_OTHER_CITY,
                nearest_city: nearest,
            }
        }
        // Nothing to deliver, so no delivery estimate. The back-order lead
        // time in the settings is quoted by the ordering flow, not here.
        _ => AvailabilityResult {
            status: AvailabilityStatus::OnOrder,
            is_available: false,
            is_local_stock: false,
            local_quantity: 0,
            other_cities_quantity: 0,
            delivery_days: None,
            label: LABEL_ON_ORDER.to_string(),
            badge_class: BADGE_ON_ORDER,
            nearest_city: None,
        },
    }
}

fn no_data() -> AvailabilityResult {
    AvailabilityResult {
        status: AvailabilityStatus::NoData,
        is_available: false,
        is_local_stock: false,
        local_quantity: 0,
        other_cities_quantity: 0,
        delivery_days: None,
        label: LABEL_OUT_OF_STOCK.to_string(),
        badge_class: BADGE_NO_DATA,
        nearest_city: None,
    }
}

fn quantity_label(settings: &StockSettings, quantity: i64) -> String {
    if settings.show_quantity {
        format!("{LABEL_IN_STOCK} ({quantity} шт.)")
    } else {
        LABEL_IN_STOCK.to_string()
    }
}

/// Best out-of-town source: stocked warehouses ordered by kind priority, then
/// by depth of stock.
fn nearest_warehouse(stock: &AggregatedAvailability, city: &str) -> Option<NearestStock> {
    stock
        .by_warehouse
        .iter()
        .filter(|w| normalize_city(&w.city) != city && w.available > 0)
        .min_by_key(|w| (w.kind.priority(), std::cmp::Reverse(w.available)))
        .map(|w| NearestStock {
            city: w.city.clone(),
            quantity: w.available,
        })
}

/// Picks the warehouse a reservation should land on when the caller does not
/// pin one: the customer's own city first, then warehouse-kind priority, then
/// the deepest stock. Only warehouses that can satisfy the full quantity
/// qualify.
pub fn select_warehouse(
    stock: &AggregatedAvailability,
    quantity: i64,
    preferred_city: Option<&str>,
) -> Option<uuid::Uuid> {
    let candidates: Vec<_> = stock
        .by_warehouse
        .iter()
        .filter(|w| w.available >= quantity)
        .collect();

    if let Some(city) = preferred_city {
        let normalized = normalize_city(city);
        if let Some(local) = candidates
            .iter()
            .find(|w| normalize_city(&w.city) == normalized)
        {
            return Some(local.warehouse_id);
        }
    }

    candidates
        .into_iter()
        .min_by_key(|w| (w.kind.priority(), std::cmp::Reverse(w.available)))
        .map(|w| w.warehouse_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::warehouse::WarehouseKind;
    use crate::stock::aggregate::WarehouseAvailability;
    use test_case::test_case;
    use uuid::Uuid;

    #[test_case("г. Сургут", "Сургут"; "abbreviated prefix")]
    #[test_case("Город Сургут", "Сургут"; "word prefix")]
    #[test_case("СУРГУТ", "Сургут"; "shouting")]
    #[test_case("  новый   уренгой ", "Новый Уренгой"; "spacing and case")]
    #[test_case("Грозный", "Грозный"; "leading letter is not a prefix")]
    fn city_normalization(raw: &str, expected: &str) {
        assert_eq!(normalize_city(raw), expected);
    }

    fn slice(city: &str, kind: WarehouseKind, available: i64) -> WarehouseAvailability {
        WarehouseAvailability {
            warehouse_id: Uuid::new_v4(),
            warehouse_name: format!("Склад {city}"),
            city: city.to_string(),
            region: "ХМАО".to_string(),
            kind,
            quantity: available,
            available,
            reserved: 0,
        }
    }

    fn aggregated(by_warehouse: Vec<WarehouseAvailability>) -> AggregatedAvailability {
        let total_quantity = by_warehouse.iter().map(|w| w.quantity).sum();
        let total_available = by_warehouse.iter().map(|w| w.available).sum();
        let total_reserved = by_warehouse.iter().map(|w| w.reserved).sum();
        AggregatedAvailability {
            item_id: Uuid::new_v4(),
            item_type: "trailer".to_string(),
            total_quantity,
            total_available,
            total_reserved,
            total_in_transit: 0,
            by_warehouse,
        }
    }

    #[test]
    fn local_stock_wins() {
        let stock = aggregated(vec![
            slice("Сургут", WarehouseKind::Main, 2),
            slice("Ноябрьск", WarehouseKind::Regional, 5),
        ]);
        let result = resolve(Some(&stock), "г. Сургут", &StockSettings::default());
        assert_eq!(result.status, AvailabilityStatus::InStock);
        assert!(result.is_local_stock);
        assert_eq!(result.local_quantity, 2);
        assert_eq!(result.other_cities_quantity, 5);
        assert_eq!(result.label, LABEL_IN_STOCK);
        assert_eq!(result.delivery_days.as_deref(), Some("0-1"));
    }

    #[test]
    fn other_city_stock_quotes_transfer_delivery() {
        let stock = aggregated(vec![
            slice("Сургут", WarehouseKind::Main, 0),
            slice("Ноябрьск", WarehouseKind::Regional, 3),
        ]);
        let result = resolve(Some(&stock), "Сургут", &StockSettings::default());
        assert_eq!(result.status, AvailabilityStatus::FromOtherCity);
        assert!(result.is_available);
        assert!(!result.is_local_stock);
        assert_eq!(result.delivery_days.as_deref(), Some("1-4"));
        assert_eq!(result.nearest_city.unwrap().city, "Ноябрьск");
    }

    #[test]
    fn sold_out_everywhere_is_on_order_without_delivery_estimate() {
        let stock = aggregated(vec![slice("Сургут", WarehouseKind::Main, 0)]);
        let result = resolve(Some(&stock), "Сургут", &StockSettings::default());
        assert_eq!(result.status, AvailabilityStatus::OnOrder);
        assert!(!result.is_available);
        assert_eq!(result.label, LABEL_ON_ORDER);
        assert_eq!(result.delivery_days, None);
    }

    #[test]
    fn missing_aggregate_is_no_data_not_on_order() {
        let result = resolve(None, "Сургут", &StockSettings::default());
        assert_eq!(result.status, AvailabilityStatus::NoData);
        assert_eq!(result.label, LABEL_OUT_OF_STOCK);
        assert_eq!(result.delivery_days, None);
    }

    #[test]
    fn show_quantity_embeds_count() {
        let stock = aggregated(vec![slice("Сургут", WarehouseKind::Main, 2)]);
        let settings = StockSettings {
            show_quantity: true,
            ..StockSettings::default()
        };
        let result = resolve(Some(&stock), "Сургут", &settings);
        assert_eq!(result.label, "В наличии (2 шт.)");
    }

    #[test]
    fn total_mode_ignores_city_scoping() {
        let stock = aggregated(vec![slice("Ноябрьск", WarehouseKind::Regional, 4)]);
        let settings = StockSettings {
            display_mode: StockDisplayMode::Total,
            ..StockSettings::default()
        };
        let result = resolve(Some(&stock), "Сургут", &settings);
        assert_eq!(result.status, AvailabilityStatus::InStock);
        assert!(result.is_available);
    }

    #[test]
    fn hidden_mode_never_shows_quantities() {
        let stock = aggregated(vec![slice("Сургут", WarehouseKind::Main, 7)]);
        let settings = StockSettings {
            display_mode: StockDisplayMode::Hidden,
            show_quantity: true,
            ..StockSettings::default()
        };
        let result = resolve(Some(&stock), "Сургут", &settings);
        assert_eq!(result.label, LABEL_IN_STOCK);
    }

    #[test]
    fn hidden_mode_sellout_has_no_delivery_estimate() {
        let stock = aggregated(vec![slice("Сургут", WarehouseKind::Main, 0)]);
        let settings = StockSettings {
            display_mode: StockDisplayMode::Hidden,
            ..StockSettings::default()
        };
        let result = resolve(Some(&stock), "Сургут", &settings);
        assert_eq!(result.status, AvailabilityStatus::OnOrder);
        assert!(!result.is_available);
        assert_eq!(result.delivery_days, None);
    }

    #[test]
    fn warehouse_selection_prefers_customer_city() {
        let local = slice("Сургут", WarehouseKind::Partner, 2);
        let main = slice("Ноябрьск", WarehouseKind::Main, 10);
        let local_id = local.warehouse_id;
        let stock = aggregated(vec![main, local]);
        assert_eq!(
            select_warehouse(&stock, 2, Some("г. Сургут")),
            Some(local_id)
        );
    }

    #[test]
    fn warehouse_selection_falls_back_to_kind_priority() {
        let partner = slice("Сургут", WarehouseKind::Partner, 9);
        let main = slice("Ноябрьск", WarehouseKind::Main, 3);
        let main_id = main.warehouse_id;
        let stock = aggregated(vec![partner, main]);
        assert_eq!(select_warehouse(&stock, 2, None), Some(main_id));
    }

    #[test]
    fn warehouse_selection_requires_full_quantity() {
        let shallow = slice("Сургут", WarehouseKind::Main, 1);
        let deep = slice("Ноябрьск", WarehouseKind::Partner, 5);
        let deep_id = deep.warehouse_id;
        let stock = aggregated(vec![shallow, deep]);
        assert_eq!(select_warehouse(&stock, 3, Some("Сургут")), Some(deep_id));
        assert_eq!(select_warehouse(&stock, 6, None), None);
    }
}
