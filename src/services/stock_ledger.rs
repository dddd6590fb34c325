//! Persistent reservation ledger.
//!
//! Each transition runs in one transaction: mutate the stock row, append the
//! audit movement, commit, then emit the event. The reserve path closes the
//! check-then-act race with a single conditional `UPDATE ... WHERE
//! available_quantity >= n`; clamped transitions (release, commit) use an
//! optimistic guard on the previous counter value instead.

use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::stock_movement::{self, MovementType};
use crate::entities::stock_record::{self, ItemType};
use crate::entities::warehouse;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::stock::aggregate::{self, AggregatedAvailability};
use crate::stock::availability::select_warehouse;
use crate::stock::levels::StockLevels;

lazy_static! {
    static ref STOCK_MOVEMENTS: IntCounterVec = register_int_counter_vec!(
        "stock_movements_total",
        "Ledger transitions applied, by movement type",
        &["movement_type"]
    )
    .unwrap();
    static ref STOCK_RESERVATION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "stock_reservation_failures_total",
        "Rejected reservations, by reason",
        &["reason"]
    )
    .unwrap();
}

/// Stateful side of the stock system. All reads and writes for
/// `stock_records` and `stock_movements` go through here.
#[derive(Clone)]
pub struct StockLedgerService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl StockLedgerService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Records new stock arriving at a warehouse, creating the stock row on
    /// first receipt. `from_transit` drains the in-transit counter.
    #[instrument(skip(self))]
    pub async fn receive(
        &self,
        item_id: Uuid,
        item_type: ItemType,
        warehouse_id: Uuid,
        quantity: i64,
        from_transit: bool,
    ) -> Result<stock_record::Model, ServiceError> {
        validate_quantity(quantity)?;
        let txn = self.db.begin().await?;

        let updated = match find_record(&txn, item_id, item_type, warehouse_id).await? {
            None => {
                stock_record::ActiveModel {
                    item_id: Set(item_id),
                    item_type: Set(item_type.as_str().to_string()),
                    warehouse_id: Set(warehouse_id),
                    quantity: Set(quantity),
                    available_quantity: Set(quantity),
                    reserved_quantity: Set(0),
                    in_transit: Set(0),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
            Some(row) => {
                let mut levels = StockLevels::from(&row);
                levels.receive(quantity, from_transit);
                apply_guarded(&txn, &row, levels).await?
            }
        };

        record_movement(
            &txn,
            MovementType::Receipt,
            item_id,
            item_type,
            None,
            Some(warehouse_id),
            quantity,
            None,
        )
        .await?;
        txn.commit().await?;

        STOCK_MOVEMENTS.with_label_values(&["receipt"]).inc();
        info!(quantity, "Stock received");
        self.emit(Event::StockReceived {
            item_id,
            warehouse_id,
            quantity,
        })
        .await;
        Ok(updated)
    }

    /// Reserves stock for a pending order. With no warehouse pinned, one is
    /// selected automatically: the preferred city first, then warehouse-kind
    /// priority, then the deepest stock.
    ///
    /// The availability check and the decrement are a single conditional
    /// update; a rejection leaves the row untouched. When no warehouse can
    /// satisfy the full quantity during auto-selection, the error carries a
    /// nil warehouse id and the network-wide available total.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        item_id: Uuid,
        item_type: ItemType,
        warehouse_id: Option<Uuid>,
        quantity: i64,
        preferred_city: Option<&str>,
        order_id: Option<Uuid>,
    ) -> Result<stock_record::Model, ServiceError> {
        validate_quantity(quantity)?;

        let warehouse_id = match warehouse_id {
            Some(id) => id,
            None => self
                .pick_warehouse(item_id, item_type, quantity, preferred_city)
                .await?,
        };

        let txn = self.db.begin().await?;
        let result = stock_record::Entity::update_many()
            .col_expr(
                stock_record::Column::AvailableQuantity,
                Expr::col(stock_record::Column::AvailableQuantity).sub(quantity),
            )
            .col_expr(
                stock_record::Column::ReservedQuantity,
                Expr::col(stock_record::Column::ReservedQuantity).add(quantity),
            )
            .col_expr(stock_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stock_record::Column::ItemId.eq(item_id))
            .filter(stock_record::Column::ItemType.eq(item_type.as_str()))
            .filter(stock_record::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_record::Column::AvailableQuantity.gte(quantity))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let available = find_record(&txn, item_id, item_type, warehouse_id)
                .await?
                .map(|row| row.available_quantity)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "no stock record for item {item_id} at warehouse {warehouse_id}"
                    ))
                })?;
            STOCK_RESERVATION_FAILURES
                .with_label_values(&["insufficient_stock"])
                .inc();
            warn!(quantity, available, "Reservation rejected");
            return Err(ServiceError::InsufficientStock {
                item_id,
                warehouse_id,
                requested: quantity,
                available,
            });
        }

        record_movement(
            &txn,
            MovementType::Reservation,
            item_id,
            item_type,
            Some(warehouse_id),
            None,
            quantity,
            order_id,
        )
        .await?;
        let updated = require_record(&txn, item_id, item_type, warehouse_id).await?;
        txn.commit().await?;

        STOCK_MOVEMENTS.with_label_values(&["reservation"]).inc();
        info!(quantity, "Stock reserved");
        self.emit(Event::StockReserved {
            item_id,
            warehouse_id,
            quantity,
            order_id,
        })
        .await;
        Ok(updated)
    }

    /// Returns reserved stock to the sellable pool. Clamped to the
    /// outstanding reservation: releasing more than is reserved frees only
    /// what is actually held, and a duplicate release is a no-op.
    #[instrument(skip(self))]
    pub async fn release(
        &self,
        item_id: Uuid,
        item_type: ItemType,
        warehouse_id: Uuid,
        quantity: i64,
        order_id: Option<Uuid>,
    ) -> Result<stock_record::Model, ServiceError> {
        validate_quantity(quantity)?;
        let txn = self.db.begin().await?;
        let row = require_record(&txn, item_id, item_type, warehouse_id).await?;

        let mut levels = StockLevels::from(&row);
        let freed = levels.release(quantity);
        if freed == 0 {
            txn.commit().await?;
            return Ok(row);
        }

        let updated = apply_guarded(&txn, &row, levels).await?;
        record_movement(
            &txn,
            MovementType::Release,
            item_id,
            item_type,
            Some(warehouse_id),
            None,
            freed,
            order_id,
        )
        .await?;
        txn.commit().await?;

        STOCK_MOVEMENTS.with_label_values(&["release"]).inc();
        info!(freed, "Reservation released");
        self.emit(Event::StockReleased {
            item_id,
            warehouse_id,
            quantity: freed,
            order_id,
        })
        .await;
        Ok(updated)
    }

    /// Fulfills a reservation: the stock permanently leaves the warehouse.
    /// Clamped to the outstanding reservation; committing with nothing
    /// reserved is a no-op.
    #[instrument(skip(self))]
    pub async fn commit(
        &self,
        item_id: Uuid,
        item_type: ItemType,
        warehouse_id: Uuid,
        quantity: i64,
        order_id: Option<Uuid>,
    ) -> Result<stock_record::Model, ServiceError> {
        validate_quantity(quantity)?;
        let txn = self.db.begin().await?;
        let row = require_record(&txn, item_id, item_type, warehouse_id).await?;

        let mut levels = StockLevels::from(&row);
        let committed = levels.commit(quantity);
        if committed == 0 {
            txn.commit().await?;
            return Ok(row);
        }

        let updated = apply_guarded(&txn, &row, levels).await?;
        record_movement(
            &txn,
            MovementType::Commit,
            item_id,
            item_type,
            Some(warehouse_id),
            None,
            committed,
            order_id,
        )
        .await?;
        txn.commit().await?;

        STOCK_MOVEMENTS.with_label_values(&["commit"]).inc();
        info!(committed, "Reservation committed");
        self.emit(Event::StockCommitted {
            item_id,
            warehouse_id,
            quantity: committed,
            order_id,
        })
        .await;
        Ok(updated)
    }

    /// Moves available stock between two warehouses in one transaction. The
    /// two rows are touched in ascending warehouse-id order so concurrent
    /// opposite-direction transfers cannot deadlock.
    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        item_id: Uuid,
        item_type: ItemType,
        source_warehouse_id: Uuid,
        dest_warehouse_id: Uuid,
        quantity: i64,
    ) -> Result<(), ServiceError> {
        validate_quantity(quantity)?;
        if source_warehouse_id == dest_warehouse_id {
            return Err(ServiceError::InvalidOperation(
                "transfer source and destination must differ".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let mut ordered = [source_warehouse_id, dest_warehouse_id];
        ordered.sort();
        for wh in ordered {
            if wh == source_warehouse_id {
                self.debit_for_transfer(&txn, item_id, item_type, wh, quantity)
                    .await?;
            } else {
                credit_for_transfer(&txn, item_id, item_type, wh, quantity).await?;
            }
        }

        record_movement(
            &txn,
            MovementType::Transfer,
            item_id,
            item_type,
            Some(source_warehouse_id),
            Some(dest_warehouse_id),
            quantity,
            None,
        )
        .await?;
        txn.commit().await?;

        STOCK_MOVEMENTS.with_label_values(&["transfer"]).inc();
        info!(quantity, "Stock transferred");
        self.emit(Event::StockTransferred {
            item_id,
            source_warehouse_id,
            dest_warehouse_id,
            quantity,
        })
        .await;
        Ok(())
    }

    /// Network-wide availability for an item, joined with warehouse metadata.
    /// `None` means the item has never been stocked anywhere.
    #[instrument(skip(self))]
    pub async fn aggregated_availability(
        &self,
        item_id: Uuid,
        item_type: ItemType,
    ) -> Result<Option<AggregatedAvailability>, ServiceError> {
        let records = stock_record::Entity::find()
            .filter(stock_record::Column::ItemId.eq(item_id))
            .filter(stock_record::Column::ItemType.eq(item_type.as_str()))
            .all(self.db.as_ref())
            .await?;
        if records.is_empty() {
            return Ok(None);
        }

        let warehouse_ids: Vec<Uuid> = records.iter().map(|r| r.warehouse_id).collect();
        let warehouses = warehouse::Entity::find()
            .filter(warehouse::Column::Id.is_in(warehouse_ids))
            .all(self.db.as_ref())
            .await?;

        for record in &records {
            let levels = StockLevels::from(record);
            for violation in levels.violations() {
                warn!(
                    item_id = %record.item_id,
                    warehouse_id = %record.warehouse_id,
                    %violation,
                    "Stock invariant violation observed"
                );
                self.emit(Event::StockInvariantViolated {
                    item_id: record.item_id,
                    warehouse_id: record.warehouse_id,
                    detail: violation,
                    observed_at: Utc::now(),
                })
                .await;
            }
        }

        Ok(aggregate::aggregate(&records, &warehouses))
    }

    /// Movement history for an item, newest first.
    #[instrument(skip(self))]
    pub async fn movements(
        &self,
        item_id: Uuid,
        item_type: ItemType,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        Ok(stock_movement::Entity::find()
            .filter(stock_movement::Column::ItemId.eq(item_id))
            .filter(stock_movement::Column::ItemType.eq(item_type.as_str()))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?)
    }

    async fn pick_warehouse(
        &self,
        item_id: Uuid,
        item_type: ItemType,
        quantity: i64,
        preferred_city: Option<&str>,
    ) -> Result<Uuid, ServiceError> {
        let aggregated = self
            .aggregated_availability(item_id, item_type)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("no stock records for item {item_id}")))?;
        select_warehouse(&aggregated, quantity, preferred_city).ok_or_else(|| {
            STOCK_RESERVATION_FAILURES
                .with_label_values(&["no_warehouse"])
                .inc();
            ServiceError::InsufficientStock {
                item_id,
                warehouse_id: Uuid::nil(),
                requested: quantity,
                available: aggregated.total_available,
            }
        })
    }

    async fn debit_for_transfer(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        item_id: Uuid,
        item_type: ItemType,
        warehouse_id: Uuid,
        quantity: i64,
    ) -> Result<(), ServiceError> {
        let result = stock_record::Entity::update_many()
            .col_expr(
                stock_record::Column::Quantity,
                Expr::col(stock_record::Column::Quantity).sub(quantity),
            )
            .col_expr(
                stock_record::Column::AvailableQuantity,
                Expr::col(stock_record::Column::AvailableQuantity).sub(quantity),
            )
            .col_expr(stock_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stock_record::Column::ItemId.eq(item_id))
            .filter(stock_record::Column::ItemType.eq(item_type.as_str()))
            .filter(stock_record::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_record::Column::AvailableQuantity.gte(quantity))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            let available = find_record(txn, item_id, item_type, warehouse_id)
                .await?
                .map(|row| row.available_quantity)
                .unwrap_or(0);
            return Err(ServiceError::InsufficientStock {
                item_id,
                warehouse_id,
                requested: quantity,
                available,
            });
        }
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to emit stock event");
            }
        }
    }
}

fn validate_quantity(quantity: i64) -> Result<(), ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::ValidationError(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

async fn find_record<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    item_type: ItemType,
    warehouse_id: Uuid,
) -> Result<Option<stock_record::Model>, ServiceError> {
    Ok(stock_record::Entity::find()
        .filter(stock_record::Column::ItemId.eq(item_id))
        .filter(stock_record::Column::ItemType.eq(item_type.as_str()))
        .filter(stock_record::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await?)
}

async fn require_record<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    item_type: ItemType,
    warehouse_id: Uuid,
) -> Result<stock_record::Model, ServiceError> {
    find_record(conn, item_id, item_type, warehouse_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "no stock record for item {item_id} at warehouse {warehouse_id}"
            ))
        })
}

/// Writes the new counter values guarded by the previously observed ones.
/// Zero affected rows means another writer interleaved.
async fn apply_guarded<C: ConnectionTrait>(
    conn: &C,
    row: &stock_record::Model,
    levels: StockLevels,
) -> Result<stock_record::Model, ServiceError> {
    let result = stock_record::Entity::update_many()
        .col_expr(stock_record::Column::Quantity, Expr::value(levels.quantity))
        .col_expr(
            stock_record::Column::AvailableQuantity,
            Expr::value(levels.available),
        )
        .col_expr(
            stock_record::Column::ReservedQuantity,
            Expr::value(levels.reserved),
        )
        .col_expr(
            stock_record::Column::InTransit,
            Expr::value(levels.in_transit),
        )
        .col_expr(stock_record::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(stock_record::Column::Id.eq(row.id))
        .filter(stock_record::Column::Quantity.eq(row.quantity))
        .filter(stock_record::Column::AvailableQuantity.eq(row.available_quantity))
        .filter(stock_record::Column::ReservedQuantity.eq(row.reserved_quantity))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(row.item_id));
    }
    stock_record::Entity::find_by_id(row.id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::InternalError("stock row vanished mid-transaction".to_string()))
}

async fn credit_for_transfer<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    item_type: ItemType,
    warehouse_id: Uuid,
    quantity: i64,
) -> Result<(), ServiceError> {
    if find_record(conn, item_id, item_type, warehouse_id)
        .await?
        .is_none()
    {
        stock_record::ActiveModel {
            item_id: Set(item_id),
            item_type: Set(item_type.as_str().to_string()),
            warehouse_id: Set(warehouse_id),
            quantity: Set(quantity),
            available_quantity: Set(quantity),
            reserved_quantity: Set(0),
            in_transit: Set(0),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        return Ok(());
    }

    stock_record::Entity::update_many()
        .col_expr(
            stock_record::Column::Quantity,
            Expr::col(stock_record::Column::Quantity).add(quantity),
        )
        .col_expr(
            stock_record::Column::AvailableQuantity,
            Expr::col(stock_record::Column::AvailableQuantity).add(quantity),
        )
        .col_expr(stock_record::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(stock_record::Column::ItemId.eq(item_id))
        .filter(stock_record::Column::ItemType.eq(item_type.as_str()))
        .filter(stock_record::Column::WarehouseId.eq(warehouse_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn record_movement<C: ConnectionTrait>(
    conn: &C,
    movement_type: MovementType,
    item_id: Uuid,
    item_type: ItemType,
    source_warehouse_id: Option<Uuid>,
    dest_warehouse_id: Option<Uuid>,
    quantity: i64,
    order_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    stock_movement::ActiveModel {
        movement_type: Set(movement_type.as_str().to_string()),
        item_id: Set(item_id),
        item_type: Set(item_type.as_str().to_string()),
        source_warehouse_id: Set(source_warehouse_id),
        dest_warehouse_id: Set(dest_warehouse_id),
        quantity: Set(quantity),
        order_id: Set(order_id),
        note: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}
