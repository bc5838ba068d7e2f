//! # Voltbook Core
//!
//! The time-slot reservation and capacity-consistency engine for the Voltbook
//! EV-charging-station booking backend.
//!
//! The engine is built from six collaborating components:
//!
//! - [`calendar::TimeSlotCalendar`] - the fixed daily slot grid and operating
//!   hours; decides which instants are bookable at all.
//! - [`ledger::CapacityLedger`] - per-station capacity counters with clamped,
//!   compare-and-swap mutation.
//! - [`status`] - the booking lifecycle state machine and the signed capacity
//!   delta every transition implies.
//! - [`availability::AvailabilityResolver`] - remaining capacity at a
//!   station+time computed from outstanding bookings; admission check and
//!   public availability query.
//! - [`coordinator::ReservationCoordinator`] - orchestrates create, status
//!   change, reschedule, and cancel, serializing all capacity mutation per
//!   station.
//! - [`auditor::ConsistencyAuditor`] - recomputes a station's capacity from
//!   scratch to detect and repair drift.
//!
//! Persistence is abstracted behind the [`store`] traits; production code
//! plugs in `voltbook-postgres`, tests plug in the in-memory stores from
//! `voltbook-testing`. Time is injected via [`environment::Clock`] so every
//! path is deterministic under test.

pub mod auditor;
pub mod availability;
pub mod calendar;
pub mod coordinator;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod policy;
pub mod status;
pub mod store;
pub mod types;

pub use auditor::{CapacityReport, ConsistencyAuditor};
pub use availability::{AvailabilityResolver, SlotAvailability, StationAvailability};
pub use calendar::{OperatingHours, TimeSlot, TimeSlotCalendar, SLOT_DURATION_HOURS};
pub use coordinator::{CreatedReservation, ReservationCoordinator, TransitionOutcome};
pub use environment::{Clock, SystemClock};
pub use error::BookingError;
pub use locks::StationLocks;
pub use policy::TransitionGuard;
pub use status::{capacity_delta, BookingStatus, StatusClass};
pub use store::{BookingStore, StationStore, StoreError, StoreResult};
pub use types::{Booking, BookingId, OwnerId, Station, StationId};
