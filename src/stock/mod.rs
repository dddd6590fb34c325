//! Stock domain logic: counter arithmetic, aggregation and availability
//! resolution. Pure computation only; transactional state lives in
//! [`crate::services::stock_ledger`].

pub mod aggregate;
pub mod availability;
pub mod levels;

pub use aggregate::{aggregate, AggregatedAvailability, WarehouseAvailability};
pub use availability::{normalize_city, resolve, AvailabilityResult, AvailabilityStatus};
pub use levels::{InsufficientStock, StockLevels};
