//! Application state for the Voltbook HTTP server.

use std::sync::Arc;
use voltbook_core::{
    AvailabilityResolver, Clock, ConsistencyAuditor, ReservationCoordinator, StationLocks,
    StationStore, TimeSlotCalendar, TransitionGuard,
};

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request. The coordinator and auditor
/// share one [`StationLocks`] table, so repair writes serialize with
/// reservation traffic.
#[derive(Clone)]
pub struct AppState {
    /// Reservation orchestration (create / transition / reschedule / cancel)
    pub coordinator: Arc<ReservationCoordinator>,
    /// From-scratch capacity recomputation and repair
    pub auditor: Arc<ConsistencyAuditor>,
    /// Station records, for registration and lookups
    pub stations: Arc<dyn StationStore>,
    /// Clock shared with the engine
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the full engine over a pair of stores.
    #[must_use]
    pub fn new(
        stations: Arc<dyn StationStore>,
        bookings: Arc<dyn voltbook_core::BookingStore>,
        guard: Arc<dyn TransitionGuard>,
        clock: Arc<dyn Clock>,
        calendar: TimeSlotCalendar,
    ) -> Self {
        let locks = StationLocks::new();
        let coordinator = Arc::new(ReservationCoordinator::new(
            Arc::clone(&stations),
            Arc::clone(&bookings),
            guard,
            Arc::clone(&clock),
            calendar,
            locks.clone(),
        ));
        let auditor = Arc::new(ConsistencyAuditor::new(
            Arc::clone(&stations),
            bookings,
            Arc::clone(&clock),
            locks,
        ));
        Self {
            coordinator,
            auditor,
            stations,
            clock,
        }
    }

    /// The read-only availability queries.
    #[must_use]
    pub fn resolver(&self) -> &AvailabilityResolver {
        self.coordinator.resolver()
    }
}
