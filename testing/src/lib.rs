//! # Voltbook Testing
//!
//! Testing utilities for the Voltbook reservation engine:
//!
//! - In-memory implementations of the persistence contracts
//! - A fixed clock for deterministic time
//! - Fixture helpers for stations and slot times
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use voltbook_core::{ReservationCoordinator, StationLocks, TimeSlotCalendar};
//! use voltbook_core::policy::PermissiveGuard;
//! use voltbook_testing::mocks::{InMemoryBookingStore, InMemoryStationStore, test_clock};
//!
//! # tokio_test::block_on(async {
//! let stations = Arc::new(InMemoryStationStore::new());
//! let bookings = Arc::new(InMemoryBookingStore::new());
//! let coordinator = ReservationCoordinator::new(
//!     stations.clone(),
//!     bookings.clone(),
//!     Arc::new(PermissiveGuard),
//!     Arc::new(test_clock()),
//!     TimeSlotCalendar::reference(),
//!     StationLocks::new(),
//! );
//! # let _ = coordinator;
//! # });
//! ```

pub mod mocks;

/// Fixture helpers for building test data.
pub mod fixtures {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use voltbook_core::{Station, StationId};

    /// A station with the given capacity, active, all slots free, stamped
    /// with the test clock's epoch.
    #[must_use]
    pub fn station(total_slots: u32) -> Station {
        Station::new(
            StationId::new(),
            "Test Station".to_string(),
            total_slots,
            super::mocks::test_clock_time(),
        )
    }

    /// A grid-aligned slot start on the reference calendar:
    /// `2024-01-15T{hour}:00:00Z`. Pass an even hour between 6 and 22.
    ///
    /// # Panics
    ///
    /// Panics if `hour` is not a valid hour of day.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn slot_at(hour: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
            .and_utc()
    }
}

pub use mocks::{test_clock, FixedClock, InMemoryBookingStore, InMemoryStationStore};
