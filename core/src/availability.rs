//! Remaining capacity at a station and time.
//!
//! The resolver answers "how many more slots fit at this station at this
//! instant" by subtracting every outstanding (non-freed) booking at that
//! exact time from the station's physical capacity. It backs both the
//! admission check the coordinator runs before committing a reservation and
//! the public availability queries; it never mutates anything.
//!
//! Note the deliberate asymmetry with the ledger: a `Pending` booking holds
//! no ledger capacity yet, but it does count here, so admission control sees
//! bookings the moment they exist.

use crate::calendar::{TimeSlot, TimeSlotCalendar};
use crate::error::BookingError;
use crate::store::{BookingStore, StationStore};
use crate::types::{BookingId, Station, StationId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Availability of one station at one slot time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StationAvailability {
    /// Physical slot count
    pub total: u32,
    /// Slots still open at the queried time
    pub available: u32,
    /// Whether at least one slot is open
    pub is_available: bool,
}

/// Availability of one calendar slot on a queried date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    /// The calendar slot
    pub slot: TimeSlot,
    /// Slots still open at that time
    pub available: u32,
    /// Whether at least one slot is open
    pub is_available: bool,
}

/// Read-only capacity queries over outstanding bookings.
#[derive(Clone)]
pub struct AvailabilityResolver {
    stations: Arc<dyn StationStore>,
    bookings: Arc<dyn BookingStore>,
    calendar: TimeSlotCalendar,
}

impl AvailabilityResolver {
    /// Creates a resolver over the two stores and the slot calendar.
    #[must_use]
    pub fn new(
        stations: Arc<dyn StationStore>,
        bookings: Arc<dyn BookingStore>,
        calendar: TimeSlotCalendar,
    ) -> Self {
        Self {
            stations,
            bookings,
            calendar,
        }
    }

    /// Remaining capacity at `(station_id, time)`: the station's total minus
    /// the slots of every booking at that exact time whose status is not
    /// freeing, optionally excluding one booking id (used when re-checking
    /// an in-flight update against its own reservation).
    ///
    /// # Errors
    ///
    /// [`BookingError::StationNotFound`] or a wrapped store failure.
    pub async fn available_at(
        &self,
        station_id: StationId,
        time: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<u32, BookingError> {
        let station = self
            .stations
            .get(station_id)
            .await?
            .ok_or(BookingError::StationNotFound(station_id))?;
        self.available_for(&station, time, exclude).await
    }

    /// As [`Self::available_at`], for a station record the caller already
    /// holds (the coordinator's commit path avoids a second point read).
    ///
    /// # Errors
    ///
    /// Wrapped store failure.
    pub async fn available_for(
        &self,
        station: &Station,
        time: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<u32, BookingError> {
        let taken = self
            .bookings
            .sum_outstanding_slots_at(station.id, time, exclude)
            .await?;
        Ok(station.total_slots.saturating_sub(taken))
    }

    /// Whether `slots_requested` more slots fit at `(station_id, time)`.
    ///
    /// # Errors
    ///
    /// [`BookingError::StationNotFound`] or a wrapped store failure.
    pub async fn has_capacity(
        &self,
        station_id: StationId,
        time: DateTime<Utc>,
        slots_requested: u32,
        exclude: Option<BookingId>,
    ) -> Result<bool, BookingError> {
        Ok(self.available_at(station_id, time, exclude).await? >= slots_requested)
    }

    /// Availability snapshot for one station at one time, as exposed to the
    /// HTTP layer.
    ///
    /// # Errors
    ///
    /// [`BookingError::StationNotFound`] or a wrapped store failure.
    pub async fn snapshot(
        &self,
        station_id: StationId,
        time: DateTime<Utc>,
    ) -> Result<StationAvailability, BookingError> {
        let station = self
            .stations
            .get(station_id)
            .await?
            .ok_or(BookingError::StationNotFound(station_id))?;
        let available = self.available_for(&station, time, None).await?;
        Ok(StationAvailability {
            total: station.total_slots,
            available,
            is_available: available > 0,
        })
    }

    /// Per-slot availability across a whole date, in grid order.
    ///
    /// # Errors
    ///
    /// [`BookingError::StationNotFound`] or a wrapped store failure.
    pub async fn day_schedule(
        &self,
        station_id: StationId,
        date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>, BookingError> {
        let station = self
            .stations
            .get(station_id)
            .await?
            .ok_or(BookingError::StationNotFound(station_id))?;

        let mut schedule = Vec::new();
        for slot in self.calendar.slots_for_date(date) {
            let available = self.available_for(&station, slot.start_time, None).await?;
            schedule.push(SlotAvailability {
                slot,
                available,
                is_available: available > 0,
            });
        }
        Ok(schedule)
    }
}
