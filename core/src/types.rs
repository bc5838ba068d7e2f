//! Domain types for the reservation engine.
//!
//! Identifier newtypes wrap [`Uuid`] so a booking id can never be passed
//! where a station id is expected. The two persisted records, [`Station`] and
//! [`Booking`], are exchanged with the persistence layer as plain structured
//! values.

use crate::status::BookingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a charging station
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationId(Uuid);

impl StationId {
    /// Creates a new random `StationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `StationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to the account that owns a booking.
///
/// Account management lives outside this engine; the owner id is carried
/// through untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates a new random `OwnerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OwnerId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A charging station, seen through the capacity fields this engine owns.
///
/// Invariant: `0 <= available_slots <= total_slots` after every engine
/// operation completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Unique station identifier
    pub id: StationId,
    /// Display name (owned by the station-management collaborator)
    pub name: String,
    /// Physical charging-point capacity, at least 1
    pub total_slots: u32,
    /// Cached capacity counter
    pub available_slots: u32,
    /// Inactive stations reject new reservations
    pub is_active: bool,
    /// Last capacity mutation
    pub updated_at: DateTime<Utc>,
}

impl Station {
    /// Creates a new active station with all slots available.
    #[must_use]
    pub const fn new(id: StationId, name: String, total_slots: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            total_slots,
            available_slots: total_slots,
            is_active: true,
            updated_at: now,
        }
    }
}

/// A charging-slot reservation.
///
/// Bookings are created `Pending` and only ever mutated through status
/// transitions; cancellation is a status, not a deletion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier
    pub id: BookingId,
    /// Account that requested the reservation
    pub owner: OwnerId,
    /// Station being reserved
    pub station_id: StationId,
    /// Slot start instant; always one of the calendar's grid starts
    pub reservation_time: DateTime<Utc>,
    /// Charging points occupied by this booking, at least 1
    pub slots_requested: u32,
    /// Current lifecycle status
    pub status: BookingStatus,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
    /// Last status or target mutation
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new `Pending` booking.
    #[must_use]
    pub const fn new(
        id: BookingId,
        owner: OwnerId,
        station_id: StationId,
        reservation_time: DateTime<Utc>,
        slots_requested: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            station_id,
            reservation_time,
            slots_requested,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_starts_full_and_active() {
        let now = Utc::now();
        let station = Station::new(StationId::new(), "Dock A".to_string(), 4, now);
        assert_eq!(station.available_slots, 4);
        assert!(station.is_active);
    }

    #[test]
    fn booking_starts_pending() {
        let now = Utc::now();
        let booking = Booking::new(
            BookingId::new(),
            OwnerId::new(),
            StationId::new(),
            now,
            1,
            now,
        );
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.created_at, booking.updated_at);
    }

    #[test]
    fn ids_are_distinct_types_with_display() {
        let id = StationId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
