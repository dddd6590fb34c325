//! Stateful services over the database: the reservation ledger and the
//! catalog read side.

pub mod catalog;
pub mod stock_ledger;

pub use catalog::CatalogService;
pub use stock_ledger::StockLedgerService;
