//! Verdicts supplied by the upstream validation collaborator.
//!
//! Business time-window rules (advance-booking limits, cancellation and
//! modification cutoffs, near-time status restrictions, actor ownership)
//! live outside this engine. The coordinator applies the collaborator's
//! verdict before mutating state and never re-derives it.

use crate::status::BookingStatus;
use crate::types::Booking;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Pass/fail verdict source for status transitions.
#[async_trait]
pub trait TransitionGuard: Send + Sync {
    /// Whether the transition of `booking` to `new_status` is allowed given
    /// the current time versus the reservation time. A `false` verdict is
    /// surfaced to the caller as an invalid transition.
    async fn allows_transition(
        &self,
        booking: &Booking,
        new_status: BookingStatus,
        now: DateTime<Utc>,
    ) -> bool;
}

/// Guard that admits every state-machine-legal transition. Used where no
/// upstream policy is wired in (and throughout the test suites).
#[derive(Clone, Copy, Debug, Default)]
pub struct PermissiveGuard;

#[async_trait]
impl TransitionGuard for PermissiveGuard {
    async fn allows_transition(
        &self,
        _booking: &Booking,
        _new_status: BookingStatus,
        _now: DateTime<Utc>,
    ) -> bool {
        true
    }
}
