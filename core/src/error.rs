//! Error kinds surfaced by the reservation engine.

use crate::status::BookingStatus;
use crate::store::StoreError;
use crate::types::{BookingId, StationId};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure modes of the reservation engine.
///
/// `ConcurrentUpdateConflict` is only surfaced after the ledger's bounded
/// internal retry is exhausted; callers may retry the whole request. Every
/// other kind is terminal for the request and carries enough context to
/// render a precise message.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The referenced station does not exist.
    #[error("station {0} not found")]
    StationNotFound(StationId),

    /// The station exists but is not accepting reservations.
    #[error("station {0} is not accepting reservations")]
    StationInactive(StationId),

    /// The referenced booking does not exist.
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    /// The requested time is not a grid slot start inside operating hours.
    #[error("{time} is not a valid reservation slot")]
    InvalidReservationTime {
        /// The rejected instant
        time: DateTime<Utc>,
    },

    /// Not enough remaining capacity at the requested station and time.
    #[error("slot unavailable: {available} of {requested} requested slot(s) free")]
    SlotUnavailable {
        /// Remaining capacity at the requested time
        available: u32,
        /// Capacity the request asked for
        requested: u32,
    },

    /// The status change is rejected by the state machine or by the
    /// time-window policy collaborator.
    #[error("transition from {from} to {to} is not allowed")]
    InvalidTransition {
        /// Status before the attempted change
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// The station's capacity counter kept moving under us; the bounded
    /// retry budget ran out. Safe to retry the request.
    #[error("station {station_id} capacity is contended, please retry")]
    ConcurrentUpdateConflict {
        /// Station whose counter was contended
        station_id: StationId,
    },

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// True when the caller may safely retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentUpdateConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_unavailable_carries_counts() {
        let err = BookingError::SlotUnavailable {
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "slot unavailable: 1 of 2 requested slot(s) free"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn conflict_is_retryable() {
        let err = BookingError::ConcurrentUpdateConflict {
            station_id: StationId::new(),
        };
        assert!(err.is_retryable());
    }
}
