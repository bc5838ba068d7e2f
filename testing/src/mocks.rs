//! Mock implementations of the engine's injected dependencies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use voltbook_core::{
    Booking, BookingId, BookingStatus, Clock, OwnerId, Station, StationId, StationStore,
    StoreError, StoreResult,
};

/// Fixed clock for deterministic tests.
///
/// Always returns the same time, making tests reproducible.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// The instant the default test clock reports (2024-01-01 00:00:00 UTC).
///
/// # Panics
///
/// Never in practice; the hardcoded timestamp always parses.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .expect("hardcoded timestamp should always parse")
        .with_timezone(&Utc)
}

/// Create a default fixed clock for tests.
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(test_clock_time())
}

/// In-memory station store.
///
/// The conditional capacity write holds the map lock across its
/// compare-and-swap, so it is genuinely atomic with respect to concurrent
/// writers, exactly like the SQL `WHERE available_slots = $expected` guard
/// it stands in for.
#[derive(Debug, Default)]
pub struct InMemoryStationStore {
    stations: Mutex<HashMap<StationId, Station>>,
}

impl InMemoryStationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a station and return its id.
    pub async fn seed(&self, station: Station) -> StationId {
        let id = station.id;
        self.stations.lock().await.insert(id, station);
        id
    }
}

#[async_trait]
impl StationStore for InMemoryStationStore {
    async fn get(&self, id: StationId) -> StoreResult<Option<Station>> {
        Ok(self.stations.lock().await.get(&id).cloned())
    }

    async fn put(&self, station: Station) -> StoreResult<()> {
        self.stations.lock().await.insert(station.id, station);
        Ok(())
    }

    async fn conditional_update_capacity(
        &self,
        id: StationId,
        expected_available: u32,
        new_available: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut stations = self.stations.lock().await;
        let station = stations.get_mut(&id).ok_or(StoreError::NotFound)?;
        if station.available_slots != expected_available {
            return Ok(false);
        }
        station.available_slots = new_available;
        station.updated_at = updated_at;
        Ok(true)
    }

    async fn overwrite_capacity(
        &self,
        id: StationId,
        new_available: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut stations = self.stations.lock().await;
        let station = stations.get_mut(&id).ok_or(StoreError::NotFound)?;
        station.available_slots = new_available;
        station.updated_at = updated_at;
        Ok(())
    }
}

/// In-memory booking store.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<BookingId, Booking>>,
}

impl InMemoryBookingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bookings.
    pub async fn len(&self) -> usize {
        self.bookings.lock().await.len()
    }

    /// True when no bookings are stored.
    pub async fn is_empty(&self) -> bool {
        self.bookings.lock().await.is_empty()
    }
}

#[async_trait]
impl voltbook_core::BookingStore for InMemoryBookingStore {
    async fn get(&self, id: BookingId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.lock().await.get(&id).cloned())
    }

    async fn insert(&self, booking: Booking) -> StoreResult<()> {
        self.bookings.lock().await.insert(booking.id, booking);
        Ok(())
    }

    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings.get_mut(&id).ok_or(StoreError::NotFound)?;
        booking.status = status;
        booking.updated_at = updated_at;
        Ok(())
    }

    async fn update_target(
        &self,
        id: BookingId,
        station_id: StationId,
        reservation_time: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings.get_mut(&id).ok_or(StoreError::NotFound)?;
        booking.station_id = station_id;
        booking.reservation_time = reservation_time;
        booking.updated_at = updated_at;
        Ok(())
    }

    async fn sum_outstanding_slots_at(
        &self,
        station_id: StationId,
        time: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> StoreResult<u32> {
        Ok(self
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| {
                b.station_id == station_id
                    && b.reservation_time == time
                    && !b.status.is_freeing()
                    && Some(b.id) != exclude
            })
            .map(|b| b.slots_requested)
            .sum())
    }

    async fn sum_reserving_slots(&self, station_id: StationId) -> StoreResult<u32> {
        Ok(self
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| b.station_id == station_id && b.status.is_reserving())
            .map(|b| b.slots_requested)
            .sum())
    }

    async fn list_for_owner(&self, owner: OwnerId) -> StoreResult<Vec<Booking>> {
        let mut owned: Vec<Booking> = self
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| b.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use voltbook_core::BookingStore;

    #[test]
    fn fixed_clock_is_fixed() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[tokio::test]
    async fn conditional_update_rejects_stale_expectations() {
        let store = InMemoryStationStore::new();
        let id = store.seed(crate::fixtures::station(5)).await;

        let committed = store
            .conditional_update_capacity(id, 5, 4, test_clock_time())
            .await
            .unwrap();
        assert!(committed);

        // Stale expectation (5) no longer matches
        let committed = store
            .conditional_update_capacity(id, 5, 3, test_clock_time())
            .await
            .unwrap();
        assert!(!committed);
    }

    #[tokio::test]
    async fn outstanding_sum_excludes_freed_and_excluded() {
        use voltbook_core::{Booking, BookingId, BookingStatus, OwnerId};

        let store = InMemoryBookingStore::new();
        let station = StationId::new();
        let time = crate::fixtures::slot_at(10);
        let now = test_clock_time();

        let mut first = Booking::new(BookingId::new(), OwnerId::new(), station, time, 2, now);
        first.status = BookingStatus::Confirmed;
        let second = Booking::new(BookingId::new(), OwnerId::new(), station, time, 1, now);
        let mut freed = Booking::new(BookingId::new(), OwnerId::new(), station, time, 4, now);
        freed.status = BookingStatus::Cancelled;

        store.insert(first.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();
        store.insert(freed).await.unwrap();

        assert_eq!(
            store.sum_outstanding_slots_at(station, time, None).await.unwrap(),
            3
        );
        assert_eq!(
            store
                .sum_outstanding_slots_at(station, time, Some(second.id))
                .await
                .unwrap(),
            2
        );
        assert_eq!(store.sum_reserving_slots(station).await.unwrap(), 2);
    }
}
