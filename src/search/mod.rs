//! Smart search: query parsing, category mapping, attribute resolution and
//! the filter engine. Everything here is pure; persistence lives in
//! [`crate::services`].

pub mod attributes;
pub mod categories;
pub mod filter;
pub mod query;

pub use categories::{DetectedCategory, VehicleCategory};
pub use filter::{filter_and_sort, BrakeFilter, SortOption, TrailerFilters};
pub use query::{parse, ParsedQuery};
