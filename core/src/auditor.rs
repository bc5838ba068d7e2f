//! From-scratch capacity recomputation.
//!
//! The auditor is the second, independent path to a station's available
//! count: it ignores the incrementally maintained counter and re-derives the
//! value from the set of reserving bookings. Any disagreement with the
//! ledger is a bug signal, not an expected operating mode; the auditor logs
//! the drift and repairs it. It doubles as the oracle for the randomized
//! agreement tests.

use crate::environment::Clock;
use crate::error::BookingError;
use crate::ledger::CapacityLedger;
use crate::locks::StationLocks;
use crate::store::{BookingStore, StationStore};
use crate::types::StationId;
use std::sync::Arc;

/// Result of a recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityReport {
    /// Recomputed available count
    pub available: u32,
    /// Physical slot count
    pub total: u32,
    /// Whether the cached counter disagreed and was repaired
    pub drift_repaired: bool,
}

/// Recomputes station capacity from active bookings.
#[derive(Clone)]
pub struct ConsistencyAuditor {
    stations: Arc<dyn StationStore>,
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    ledger: CapacityLedger,
    locks: StationLocks,
}

impl ConsistencyAuditor {
    /// Creates an auditor. Pass the same [`StationLocks`] instance the
    /// coordinator uses; the repair write is a capacity mutation and must
    /// serialize with reservation traffic.
    #[must_use]
    pub fn new(
        stations: Arc<dyn StationStore>,
        bookings: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        locks: StationLocks,
    ) -> Self {
        let ledger = CapacityLedger::new(Arc::clone(&stations));
        Self {
            stations,
            bookings,
            clock,
            ledger,
            locks,
        }
    }

    /// Recompute `available = clamp(0, total, total - reserving)` for one
    /// station and write it back unconditionally.
    ///
    /// Idempotent: running twice with no intervening booking changes yields
    /// the same report.
    ///
    /// # Errors
    ///
    /// [`BookingError::StationNotFound`] or a wrapped store failure.
    pub async fn recompute(&self, station_id: StationId) -> Result<CapacityReport, BookingError> {
        let _guard = self.locks.acquire(station_id).await;

        let cached = self
            .stations
            .get(station_id)
            .await?
            .ok_or(BookingError::StationNotFound(station_id))?
            .available_slots;

        let reserving = self.bookings.sum_reserving_slots(station_id).await?;
        let (available, total) = self
            .ledger
            .recompute(station_id, reserving, self.clock.now())
            .await?;

        let drift_repaired = cached != available;
        if drift_repaired {
            tracing::warn!(
                station = %station_id,
                cached,
                recomputed = available,
                reserving,
                "capacity drift detected and repaired"
            );
        } else {
            tracing::debug!(
                station = %station_id,
                available,
                "capacity recomputation agrees with ledger"
            );
        }

        Ok(CapacityReport {
            available,
            total,
            drift_repaired,
        })
    }
}
