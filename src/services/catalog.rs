//! Read-side catalog service: visible trailers through the filter engine,
//! availability resolution per customer city, and accessory compatibility
//! for the configurator.

use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::instrument;
use uuid::Uuid;

use crate::config::{SearchConfig, StockSettings};
use crate::db::DbPool;
use crate::entities::stock_record::ItemType;
use crate::entities::{accessory, trailer};
use crate::errors::ServiceError;
use crate::search::filter::{self, TrailerFilters};
use crate::services::stock_ledger::StockLedgerService;
use crate::stock::availability::{self, AvailabilityResult};

/// Thin orchestration over the pure search and stock modules. Holds the
/// pieces of configuration those modules are parameterized by.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    ledger: StockLedgerService,
    search_config: SearchConfig,
    stock_settings: StockSettings,
}

impl CatalogService {
    pub fn new(
        db: Arc<DbPool>,
        ledger: StockLedgerService,
        search_config: SearchConfig,
        stock_settings: StockSettings,
    ) -> Self {
        Self {
            db,
            ledger,
            search_config,
            stock_settings,
        }
    }

    /// Visible trailers matching the filter set, in the requested order.
    #[instrument(skip(self, filters))]
    pub async fn search_trailers(
        &self,
        filters: &TrailerFilters,
    ) -> Result<Vec<trailer::Model>, ServiceError> {
        let visible = trailer::Entity::find()
            .filter(trailer::Column::IsVisible.eq(true))
            .all(self.db.as_ref())
            .await?;
        Ok(filter::filter_and_sort(&visible, filters, &self.search_config))
    }

    /// What a customer in `city` sees for one item.
    #[instrument(skip(self))]
    pub async fn availability_for(
        &self,
        item_id: Uuid,
        item_type: ItemType,
        city: &str,
    ) -> Result<AvailabilityResult, ServiceError> {
        let aggregated = self.ledger.aggregated_availability(item_id, item_type).await?;
        Ok(availability::resolve(
            aggregated.as_ref(),
            city,
            &self.stock_settings,
        ))
    }

    /// Visible accessories that fit the given trailer: universal ones plus
    /// those scoped to it.
    #[instrument(skip(self))]
    pub async fn accessories_for_trailer(
        &self,
        trailer_id: Uuid,
    ) -> Result<Vec<accessory::Model>, ServiceError> {
        let visible = accessory::Entity::find()
            .filter(accessory::Column::IsVisible.eq(true))
            .all(self.db.as_ref())
            .await?;
        Ok(visible.into_iter().filter(|a| a.fits(trailer_id)).collect())
    }
}
