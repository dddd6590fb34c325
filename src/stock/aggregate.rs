//! Aggregation of per-warehouse stock rows into one item-wide view.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::entities::warehouse::WarehouseKind;
use crate::entities::{stock_record, warehouse};

const UNKNOWN_WAREHOUSE: &str = "Неизвестный склад";
const UNKNOWN_CITY: &str = "Неизвестный город";

/// One warehouse's slice of an item's stock, joined with warehouse metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseAvailability {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub city: String,
    pub region: String,
    pub kind: WarehouseKind,
    pub quantity: i64,
    pub available: i64,
    pub reserved: i64,
}

/// Network-wide availability for one item. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedAvailability {
    pub item_id: Uuid,
    pub item_type: String,
    pub total_quantity: i64,
    pub total_available: i64,
    pub total_reserved: i64,
    pub total_in_transit: i64,
    pub by_warehouse: Vec<WarehouseAvailability>,
}

/// Folds an item's stock rows into totals plus the per-warehouse breakdown.
///
/// An empty slice returns `None`: never having been stocked is not the same
/// state as being sold out, and callers must render the two differently.
/// Negative counters are clamped to zero in the output and logged; corrupted
/// rows must not leak negative availability to customers.
pub fn aggregate(
    records: &[stock_record::Model],
    warehouses: &[warehouse::Model],
) -> Option<AggregatedAvailability> {
    let first = records.first()?;

    let mut result = AggregatedAvailability {
        item_id: first.item_id,
        item_type: first.item_type.clone(),
        total_quantity: 0,
        total_available: 0,
        total_reserved: 0,
        total_in_transit: 0,
        by_warehouse: Vec::with_capacity(records.len()),
    };

    for record in records {
        let quantity = clamp_counter(record, "quantity", record.quantity);
        let available = clamp_counter(record, "available_quantity", record.available_quantity);
        let reserved = clamp_counter(record, "reserved_quantity", record.reserved_quantity);
        let in_transit = clamp_counter(record, "in_transit", record.in_transit);

        result.total_quantity += quantity;
        result.total_available += available;
        result.total_reserved += reserved;
        result.total_in_transit += in_transit;

        let meta = warehouses.iter().find(|w| w.id == record.warehouse_id);
        result.by_warehouse.push(WarehouseAvailability {
            warehouse_id: record.warehouse_id,
            warehouse_name: meta
                .map(|w| w.name.clone())
                .unwrap_or_else(|| UNKNOWN_WAREHOUSE.to_string()),
            city: meta
                .map(|w| w.city.clone())
                .unwrap_or_else(|| UNKNOWN_CITY.to_string()),
            region: meta.map(|w| w.region.clone()).unwrap_or_default(),
            kind: meta
                .and_then(|w| WarehouseKind::from_str(&w.kind))
                .unwrap_or(WarehouseKind::Main),
            quantity,
            available,
            reserved,
        });
    }

    Some(result)
}

fn clamp_counter(record: &stock_record::Model, counter: &str, value: i64) -> i64 {
    if value < 0 {
        warn!(
            item_id = %record.item_id,
            warehouse_id = %record.warehouse_id,
            counter,
            value,
            "Negative stock counter clamped to zero"
        );
        0
    } else {
        value
    }
}
