//! Trailstock
//!
//! Storefront core for a multi-warehouse trailer shop: free-text smart
//! search over a heterogeneous catalog, stock aggregation across the
//! warehouse network, city-scoped availability and a transactional
//! reservation ledger. No transport layer lives here; HTTP/admin surfaces
//! are separate consumers of this crate.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod search;
pub mod services;
pub mod stock;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{CatalogService, StockLedgerService};

/// Wired-up service set sharing one connection pool, for embedding the core
/// into a binary or an integration test.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub stock_ledger: StockLedgerService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig, event_sender: Option<EventSender>) -> Self {
        let stock_ledger = StockLedgerService::new(db.clone(), event_sender);
        let catalog = CatalogService::new(
            db.clone(),
            stock_ledger.clone(),
            config.search.clone(),
            config.stock.clone(),
        );
        Self {
            db,
            config,
            stock_ledger,
            catalog,
        }
    }
}
