//! Reservation orchestration.
//!
//! The coordinator is the only entry point for mutating operations. Each
//! operation validates against the slot calendar, asks the availability
//! resolver for admission, derives the capacity delta from the state
//! machine, applies it through the ledger, and persists the booking record.
//! Every check-and-commit section runs under the station's lock from
//! [`StationLocks`], so admission and commit are atomic per station.

use crate::availability::AvailabilityResolver;
use crate::calendar::TimeSlotCalendar;
use crate::environment::Clock;
use crate::error::BookingError;
use crate::ledger::CapacityLedger;
use crate::locks::StationLocks;
use crate::policy::TransitionGuard;
use crate::status::{capacity_delta, BookingStatus};
use crate::store::{BookingStore, StationStore};
use crate::types::{Booking, BookingId, OwnerId, Station, StationId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Attempts to pin a booking's station lock before giving up. A booking only
/// changes station through an explicit reschedule, so contention here is
/// rare.
const PIN_RETRY_LIMIT: u32 = 3;

/// Result of a successful reservation creation.
#[derive(Clone, Debug)]
pub struct CreatedReservation {
    /// The persisted `Pending` booking
    pub booking: Booking,
    /// Remaining capacity at the booked time after this reservation
    pub available: u32,
}

/// Result of a successful status transition.
#[derive(Clone, Debug)]
pub struct TransitionOutcome {
    /// The booking with its new status applied
    pub booking: Booking,
    /// Slots returned to the station by this transition
    pub slots_freed: u32,
    /// Slots taken from the station by this transition
    pub slots_reserved: u32,
    /// Station available count after the delta was committed
    pub station_available: u32,
    /// Human-readable summary, e.g. `"reserved 2 slot(s)"`
    pub summary: String,
}

/// Orchestrates create / status change / reschedule / cancel.
#[derive(Clone)]
pub struct ReservationCoordinator {
    stations: Arc<dyn StationStore>,
    bookings: Arc<dyn BookingStore>,
    guard: Arc<dyn TransitionGuard>,
    clock: Arc<dyn Clock>,
    calendar: TimeSlotCalendar,
    resolver: AvailabilityResolver,
    ledger: CapacityLedger,
    locks: StationLocks,
}

impl ReservationCoordinator {
    /// Wires the coordinator over its collaborators. Pass the same
    /// [`StationLocks`] instance to the auditor so repair writes serialize
    /// with reservation traffic.
    #[must_use]
    pub fn new(
        stations: Arc<dyn StationStore>,
        bookings: Arc<dyn BookingStore>,
        guard: Arc<dyn TransitionGuard>,
        clock: Arc<dyn Clock>,
        calendar: TimeSlotCalendar,
        locks: StationLocks,
    ) -> Self {
        let resolver = AvailabilityResolver::new(
            Arc::clone(&stations),
            Arc::clone(&bookings),
            calendar.clone(),
        );
        let ledger = CapacityLedger::new(Arc::clone(&stations));
        Self {
            stations,
            bookings,
            guard,
            clock,
            calendar,
            resolver,
            ledger,
            locks,
        }
    }

    /// The read-only availability queries, sharing this coordinator's
    /// stores.
    #[must_use]
    pub const fn resolver(&self) -> &AvailabilityResolver {
        &self.resolver
    }

    /// Create a reservation.
    ///
    /// The booking is persisted `Pending`, which holds no ledger capacity
    /// but counts against admission from the moment it exists.
    /// `slots_requested` must be at least 1; the HTTP layer rejects zero
    /// before reaching the engine.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidReservationTime`] for off-grid or
    /// out-of-hours times, [`BookingError::StationNotFound`] /
    /// [`BookingError::StationInactive`], and
    /// [`BookingError::SlotUnavailable`] when admission fails.
    pub async fn create(
        &self,
        station_id: StationId,
        owner: OwnerId,
        reservation_time: DateTime<Utc>,
        slots_requested: u32,
    ) -> Result<CreatedReservation, BookingError> {
        self.validate_slot(reservation_time)?;

        let _guard = self.locks.acquire(station_id).await;
        let station = self.load_station(station_id).await?;
        if !station.is_active {
            return Err(BookingError::StationInactive(station_id));
        }

        let available = self
            .resolver
            .available_for(&station, reservation_time, None)
            .await?;
        if available < slots_requested {
            return Err(BookingError::SlotUnavailable {
                available,
                requested: slots_requested,
            });
        }

        let now = self.clock.now();
        let booking = Booking::new(
            BookingId::new(),
            owner,
            station_id,
            reservation_time,
            slots_requested,
            now,
        );
        self.bookings.insert(booking.clone()).await?;

        tracing::info!(
            booking = %booking.id,
            station = %station_id,
            time = %reservation_time,
            slots = slots_requested,
            "reservation created"
        );

        Ok(CreatedReservation {
            available: available - slots_requested,
            booking,
        })
    }

    /// Move a booking to a new status, applying the implied capacity delta.
    ///
    /// The transition must be legal in the state machine and pass the
    /// upstream time-window verdict. Reopening a freed booking re-runs the
    /// admission check, since its capacity was already returned.
    ///
    /// # Errors
    ///
    /// [`BookingError::BookingNotFound`], [`BookingError::InvalidTransition`],
    /// [`BookingError::SlotUnavailable`] on a failed reopen, or
    /// [`BookingError::ConcurrentUpdateConflict`] after retry exhaustion.
    pub async fn change_status(
        &self,
        booking_id: BookingId,
        new_status: BookingStatus,
    ) -> Result<TransitionOutcome, BookingError> {
        let (booking, _guard) = self.pin_booking(booking_id).await?;
        let old_status = booking.status;

        if !old_status.can_transition_to(new_status) {
            return Err(BookingError::InvalidTransition {
                from: old_status,
                to: new_status,
            });
        }

        let now = self.clock.now();
        if !self.guard.allows_transition(&booking, new_status, now).await {
            return Err(BookingError::InvalidTransition {
                from: old_status,
                to: new_status,
            });
        }

        if old_status.is_freeing() && new_status.is_reserving() {
            let station = self.load_station(booking.station_id).await?;
            let available = self
                .resolver
                .available_for(&station, booking.reservation_time, Some(booking.id))
                .await?;
            if available < booking.slots_requested {
                return Err(BookingError::SlotUnavailable {
                    available,
                    requested: booking.slots_requested,
                });
            }
        }

        let delta = capacity_delta(old_status, new_status, booking.slots_requested);
        let station_available = self
            .ledger
            .apply_delta(booking.station_id, delta, now)
            .await?;

        if let Err(err) = self
            .bookings
            .update_status(booking.id, new_status, now)
            .await
        {
            // Undo the committed delta so the two records stay in step.
            if delta != 0 {
                if let Err(revert) = self
                    .ledger
                    .apply_delta(booking.station_id, -delta, now)
                    .await
                {
                    tracing::error!(
                        booking = %booking.id,
                        station = %booking.station_id,
                        error = %revert,
                        "failed to revert capacity delta; station needs repair"
                    );
                }
            }
            return Err(err.into());
        }

        let (slots_freed, slots_reserved, summary) = summarize_delta(delta);
        tracing::info!(
            booking = %booking.id,
            from = %old_status,
            to = %new_status,
            delta,
            station_available,
            "booking status changed"
        );

        let mut booking = booking;
        booking.status = new_status;
        booking.updated_at = now;

        Ok(TransitionOutcome {
            booking,
            slots_freed,
            slots_reserved,
            station_available,
            summary,
        })
    }

    /// Cancel a booking. Sugar for a transition to
    /// [`BookingStatus::Cancelled`].
    ///
    /// # Errors
    ///
    /// As [`Self::change_status`].
    pub async fn cancel(&self, booking_id: BookingId) -> Result<TransitionOutcome, BookingError> {
        self.change_status(booking_id, BookingStatus::Cancelled).await
    }

    /// Move a booking to a new reservation time and/or station.
    ///
    /// Admission is re-checked against the new target with the booking's own
    /// reservation excluded from the count. For a booking in a reserving
    /// status that changes station, the occupied capacity moves with it. On
    /// any failure all state is left untouched.
    ///
    /// # Errors
    ///
    /// [`BookingError::BookingNotFound`], calendar and station validation
    /// failures, [`BookingError::SlotUnavailable`], or
    /// [`BookingError::ConcurrentUpdateConflict`].
    pub async fn reschedule(
        &self,
        booking_id: BookingId,
        new_time: Option<DateTime<Utc>>,
        new_station: Option<StationId>,
    ) -> Result<Booking, BookingError> {
        let probe = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;
        let target_station = new_station.unwrap_or(probe.station_id);
        let target_time = new_time.unwrap_or(probe.reservation_time);

        let _guards = self
            .locks
            .acquire_pair(probe.station_id, target_station)
            .await;
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        // A concurrent reschedule moved the booking to a station our locks
        // do not cover; let the caller retry against fresh state.
        if booking.station_id != probe.station_id {
            return Err(BookingError::ConcurrentUpdateConflict {
                station_id: booking.station_id,
            });
        }

        if booking.station_id == target_station && booking.reservation_time == target_time {
            return Ok(booking);
        }

        self.validate_slot(target_time)?;

        let station = self.load_station(target_station).await?;
        if !station.is_active {
            return Err(BookingError::StationInactive(target_station));
        }

        let available = self
            .resolver
            .available_for(&station, target_time, Some(booking.id))
            .await?;
        if available < booking.slots_requested {
            return Err(BookingError::SlotUnavailable {
                available,
                requested: booking.slots_requested,
            });
        }

        let now = self.clock.now();
        let moves_capacity =
            booking.status.is_reserving() && booking.station_id != target_station;
        let slots = i64::from(booking.slots_requested);

        if moves_capacity {
            self.ledger.apply_delta(target_station, -slots, now).await?;
            if let Err(err) = self
                .ledger
                .apply_delta(booking.station_id, slots, now)
                .await
            {
                self.revert_delta(target_station, slots, now).await;
                return Err(err);
            }
        }

        if let Err(err) = self
            .bookings
            .update_target(booking.id, target_station, target_time, now)
            .await
        {
            if moves_capacity {
                self.revert_delta(booking.station_id, -slots, now).await;
                self.revert_delta(target_station, slots, now).await;
            }
            return Err(err.into());
        }

        tracing::info!(
            booking = %booking.id,
            station = %target_station,
            time = %target_time,
            moved_capacity = moves_capacity,
            "reservation rescheduled"
        );

        let mut booking = booking;
        booking.station_id = target_station;
        booking.reservation_time = target_time;
        booking.updated_at = now;
        Ok(booking)
    }

    /// Fetch a booking by id.
    ///
    /// # Errors
    ///
    /// [`BookingError::BookingNotFound`] or a wrapped store failure.
    pub async fn booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        self.bookings
            .get(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    /// All bookings belonging to an owner, newest first.
    ///
    /// # Errors
    ///
    /// Wrapped store failure.
    pub async fn bookings_for_owner(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<Booking>, BookingError> {
        Ok(self.bookings.list_for_owner(owner).await?)
    }

    /// The slot calendar this coordinator validates against.
    #[must_use]
    pub const fn calendar(&self) -> &TimeSlotCalendar {
        &self.calendar
    }

    fn validate_slot(&self, time: DateTime<Utc>) -> Result<(), BookingError> {
        if self.calendar.is_valid_slot_start(time) && self.calendar.is_within_operating_hours(time)
        {
            Ok(())
        } else {
            Err(BookingError::InvalidReservationTime { time })
        }
    }

    async fn load_station(&self, station_id: StationId) -> Result<Station, BookingError> {
        self.stations
            .get(station_id)
            .await?
            .ok_or(BookingError::StationNotFound(station_id))
    }

    /// Read the booking, take its station's lock, and confirm the station
    /// did not change while the lock was being acquired (a concurrent
    /// reschedule could have moved it).
    async fn pin_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<(Booking, tokio::sync::OwnedMutexGuard<()>), BookingError> {
        for _ in 0..PIN_RETRY_LIMIT {
            let booking = self
                .bookings
                .get(booking_id)
                .await?
                .ok_or(BookingError::BookingNotFound(booking_id))?;
            let guard = self.locks.acquire(booking.station_id).await;
            let fresh = self
                .bookings
                .get(booking_id)
                .await?
                .ok_or(BookingError::BookingNotFound(booking_id))?;
            if fresh.station_id == booking.station_id {
                return Ok((fresh, guard));
            }
        }
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;
        Err(BookingError::ConcurrentUpdateConflict {
            station_id: booking.station_id,
        })
    }

    /// Best-effort compensation; a failure here leaves drift for the
    /// auditor to repair.
    async fn revert_delta(&self, station_id: StationId, delta: i64, now: DateTime<Utc>) {
        if let Err(err) = self.ledger.apply_delta(station_id, delta, now).await {
            tracing::error!(
                station = %station_id,
                delta,
                error = %err,
                "failed to revert capacity delta; station needs repair"
            );
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // |delta| fits in u32
fn summarize_delta(delta: i64) -> (u32, u32, String) {
    match delta.signum() {
        1 => (delta as u32, 0, format!("freed {delta} slot(s)")),
        -1 => (0, (-delta) as u32, format!("reserved {} slot(s)", -delta)),
        _ => (0, 0, "no capacity change".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_summaries() {
        assert_eq!(summarize_delta(2).2, "freed 2 slot(s)");
        assert_eq!(summarize_delta(-1).2, "reserved 1 slot(s)");
        assert_eq!(summarize_delta(0).2, "no capacity change");
        assert_eq!(summarize_delta(2).0, 2);
        assert_eq!(summarize_delta(-3).1, 3);
    }
}
