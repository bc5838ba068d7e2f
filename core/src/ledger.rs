//! Per-station capacity counters with clamped, compare-and-swap mutation.
//!
//! The ledger is the only writer of `Station::available_slots`. Incremental
//! changes go through [`CapacityLedger::apply_delta`], which commits via the
//! store's conditional-write primitive and retries a bounded number of times
//! when the counter moved underneath it. The auditor's repair path uses
//! [`CapacityLedger::recompute`], which overwrites unconditionally.

use crate::error::BookingError;
use crate::store::StationStore;
use crate::types::{Station, StationId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Conditional-write attempts before surfacing a conflict to the caller.
const CAS_RETRY_LIMIT: u32 = 5;

/// Clamp `available + delta` into `0..=total`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // bounded by 0..=total
pub(crate) fn clamp_capacity(total: u32, available: u32, delta: i64) -> u32 {
    let next = i64::from(available) + delta;
    next.clamp(0, i64::from(total)) as u32
}

/// Station capacity counter mutations.
#[derive(Clone)]
pub struct CapacityLedger {
    stations: Arc<dyn StationStore>,
}

impl CapacityLedger {
    /// Creates a ledger over a station store.
    #[must_use]
    pub fn new(stations: Arc<dyn StationStore>) -> Self {
        Self { stations }
    }

    /// Apply a signed delta to a station's available count, clamped into
    /// `0..=total_slots`, and return the committed value.
    ///
    /// A delta of 0 performs no write and returns the current count. The
    /// commit is a compare-and-swap against the pre-read count; on conflict
    /// the read-modify-write loop retries up to [`CAS_RETRY_LIMIT`] times
    /// before surfacing [`BookingError::ConcurrentUpdateConflict`].
    ///
    /// # Errors
    ///
    /// [`BookingError::StationNotFound`], [`BookingError::ConcurrentUpdateConflict`],
    /// or a wrapped store failure.
    pub async fn apply_delta(
        &self,
        station_id: StationId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<u32, BookingError> {
        if delta == 0 {
            return Ok(self.load(station_id).await?.available_slots);
        }

        for attempt in 0..CAS_RETRY_LIMIT {
            let station = self.load(station_id).await?;
            let next = clamp_capacity(station.total_slots, station.available_slots, delta);
            if next == station.available_slots {
                return Ok(next);
            }
            if self
                .stations
                .conditional_update_capacity(station_id, station.available_slots, next, now)
                .await?
            {
                tracing::debug!(
                    station = %station_id,
                    delta,
                    available = next,
                    "capacity delta committed"
                );
                return Ok(next);
            }
            tracing::debug!(
                station = %station_id,
                attempt,
                "capacity counter moved underneath us, retrying"
            );
        }

        Err(BookingError::ConcurrentUpdateConflict { station_id })
    }

    /// Overwrite the available count from a from-scratch recomputation:
    /// `clamp(0, total, total - active_reserved)`. Used only by the auditor.
    ///
    /// # Errors
    ///
    /// [`BookingError::StationNotFound`] or a wrapped store failure.
    pub async fn recompute(
        &self,
        station_id: StationId,
        active_reserved: u32,
        now: DateTime<Utc>,
    ) -> Result<(u32, u32), BookingError> {
        let station = self.load(station_id).await?;
        let available = station.total_slots.saturating_sub(active_reserved);
        self.stations
            .overwrite_capacity(station_id, available, now)
            .await?;
        Ok((available, station.total_slots))
    }

    async fn load(&self, station_id: StationId) -> Result<Station, BookingError> {
        self.stations
            .get(station_id)
            .await?
            .ok_or(BookingError::StationNotFound(station_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_never_exceeds_total() {
        assert_eq!(clamp_capacity(5, 5, 3), 5);
        assert_eq!(clamp_capacity(5, 4, 1), 5);
    }

    #[test]
    fn clamp_never_goes_negative() {
        assert_eq!(clamp_capacity(5, 0, -1), 0);
        assert_eq!(clamp_capacity(5, 2, -4), 0);
    }

    #[test]
    fn clamp_applies_plain_deltas() {
        assert_eq!(clamp_capacity(5, 3, -1), 2);
        assert_eq!(clamp_capacity(5, 3, 1), 4);
        assert_eq!(clamp_capacity(5, 3, 0), 3);
    }
}
