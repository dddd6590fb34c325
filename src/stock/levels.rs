//! Pure stock-counter arithmetic.
//!
//! Every ledger transition is expressed here as plain math over one
//! warehouse's counters, with the persistence layer applying the same
//! deltas transactionally. Keeping the arithmetic pure makes the invariants
//! checkable in isolation.
//!
//! Invariants after every transition: `available >= 0`, `reserved >= 0`,
//! `quantity >= 0`, `available + reserved <= quantity`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::stock_record;

/// Reservation rejected for lack of available stock. Carries the numbers a
/// caller needs to render "requested 2, available 1".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient stock: requested {requested}, available {available}")]
pub struct InsufficientStock {
    pub requested: i64,
    pub available: i64,
}

/// Counters for one (item, warehouse) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockLevels {
    pub quantity: i64,
    pub available: i64,
    pub reserved: i64,
    pub in_transit: i64,
}

impl StockLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// New stock arriving at the warehouse. When `from_transit` is set the
    /// in-transit counter is drained, clamped at zero.
    pub fn receive(&mut self, amount: i64, from_transit: bool) {
        self.quantity += amount;
        self.available += amount;
        if from_transit {
            self.in_transit = (self.in_transit - amount).max(0);
        }
    }

    /// Moves stock from the sellable pool into reservation. All or nothing:
    /// a rejected reservation leaves the counters untouched.
    pub fn reserve(&mut self, amount: i64) -> Result<(), InsufficientStock> {
        if self.available < amount {
            return Err(InsufficientStock {
                requested: amount,
                available: self.available,
            });
        }
        self.available -= amount;
        self.reserved += amount;
        Ok(())
    }

    /// Returns reserved stock to the sellable pool. Clamped to the
    /// outstanding reservation, so a duplicate release frees nothing and
    /// never inflates `available`. Returns the freed amount.
    pub fn release(&mut self, amount: i64) -> i64 {
        let freed = amount.min(self.reserved);
        self.reserved -= freed;
        self.available += freed;
        freed
    }

    /// Fulfills a reservation: stock permanently leaves the warehouse.
    /// Clamped to the outstanding reservation; returns the committed amount.
    pub fn commit(&mut self, amount: i64) -> i64 {
        let committed = amount.min(self.reserved);
        self.reserved -= committed;
        self.quantity -= committed;
        committed
    }

    /// Debit leg of a transfer: the stock must be available at the source.
    pub fn transfer_out(&mut self, amount: i64) -> Result<(), InsufficientStock> {
        if self.available < amount {
            return Err(InsufficientStock {
                requested: amount,
                available: self.available,
            });
        }
        self.available -= amount;
        self.quantity -= amount;
        Ok(())
    }

    /// Credit leg of a transfer.
    pub fn transfer_in(&mut self, amount: i64) {
        self.available += amount;
        self.quantity += amount;
    }

    /// Counter-invariant violations, empty when the state is consistent.
    pub fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.quantity < 0 {
            errors.push(format!("negative quantity: {}", self.quantity));
        }
        if self.available < 0 {
            errors.push(format!("negative available: {}", self.available));
        }
        if self.reserved < 0 {
            errors.push(format!("negative reserved: {}", self.reserved));
        }
        if self.in_transit < 0 {
            errors.push(format!("negative in_transit: {}", self.in_transit));
        }
        if self.available + self.reserved > self.quantity {
            errors.push(format!(
                "available ({}) + reserved ({}) exceeds quantity ({})",
                self.available, self.reserved, self.quantity
            ));
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

impl From<&stock_record::Model> for StockLevels {
    fn from(record: &stock_record::Model) -> Self {
        Self {
            quantity: record.quantity,
            available: record.available_quantity,
            reserved: record.reserved_quantity,
            in_transit: record.in_transit,
        }
    }
}
