//! Race-condition tests for the last-slot scenario.
//!
//! Two reservation requests racing for the final slot must resolve to
//! exactly one winner; the loser sees `SlotUnavailable`, never a negative or
//! oversold counter.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use voltbook_core::policy::PermissiveGuard;
use voltbook_core::{
    BookingError, BookingStatus, OwnerId, ReservationCoordinator, StationLocks, StationStore,
    TimeSlotCalendar,
};
use voltbook_testing::fixtures;
use voltbook_testing::mocks::{test_clock, InMemoryBookingStore, InMemoryStationStore};

fn coordinator(
    stations: &Arc<InMemoryStationStore>,
    bookings: &Arc<InMemoryBookingStore>,
) -> ReservationCoordinator {
    ReservationCoordinator::new(
        stations.clone(),
        bookings.clone(),
        Arc::new(PermissiveGuard),
        Arc::new(test_clock()),
        TimeSlotCalendar::reference(),
        StationLocks::new(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_racing_creates_produce_exactly_one_winner() {
    let stations = Arc::new(InMemoryStationStore::new());
    let bookings = Arc::new(InMemoryBookingStore::new());
    let station_id = stations.seed(fixtures::station(1)).await;
    let coordinator = coordinator(&stations, &bookings);
    let time = fixtures::slot_at(10);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .create(station_id, OwnerId::new(), time, 1)
                .await
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(BookingError::SlotUnavailable { available: 0, .. }) => losers += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(losers, 1);
    assert_eq!(bookings.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn flood_of_creates_never_oversells() {
    let stations = Arc::new(InMemoryStationStore::new());
    let bookings = Arc::new(InMemoryBookingStore::new());
    let station_id = stations.seed(fixtures::station(5)).await;
    let coordinator = coordinator(&stations, &bookings);
    let time = fixtures::slot_at(12);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .create(station_id, OwnerId::new(), time, 1)
                .await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        if let Ok(created) = handle.await.unwrap() {
            winners.push(created.booking.id);
        }
    }
    assert_eq!(winners.len(), 5);
    assert_eq!(bookings.len().await, 5);

    // Confirming every winner drains the ledger to exactly zero.
    for id in winners {
        coordinator
            .change_status(id, BookingStatus::Confirmed)
            .await
            .unwrap();
    }
    let station = stations.get(station_id).await.unwrap().unwrap();
    assert_eq!(station.available_slots, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_transitions_keep_counter_in_bounds() {
    let stations = Arc::new(InMemoryStationStore::new());
    let bookings = Arc::new(InMemoryBookingStore::new());
    let station_id = stations.seed(fixtures::station(4)).await;
    let coordinator = coordinator(&stations, &bookings);
    let time = fixtures::slot_at(16);

    let mut ids = Vec::new();
    for _ in 0..4 {
        let created = coordinator
            .create(station_id, OwnerId::new(), time, 1)
            .await
            .unwrap();
        ids.push(created.booking.id);
    }

    // Confirm and cancel concurrently from many tasks.
    let mut handles = Vec::new();
    for id in ids {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .change_status(id, BookingStatus::Confirmed)
                .await?;
            coordinator.cancel(id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let station = stations.get(station_id).await.unwrap().unwrap();
    assert!(station.available_slots <= station.total_slots);
    assert_eq!(station.available_slots, 4);
}
