//! Booking lifecycle state machine.
//!
//! [`BookingStatus`] is a closed enumeration with an explicit classification
//! table (reserving / freeing / neutral), so the capacity-delta function is
//! exhaustive and statically checkable. [`capacity_delta`] is the single
//! source of truth for capacity accounting: every call site that changes a
//! booking's status goes through it, and the recomputation path in the
//! auditor must agree with the sums it produces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booking lifecycle status.
///
/// ```text
/// Pending ─→ Confirmed ─→ InProgress ─→ Completed
///    │           │             │
///    │           ├─────────────┼──→ Cancelled ─┐
///    │           └─────────────┴──→ NoShow ────┤ (reopen, unusual)
///    └──→ Cancelled                            └──→ Confirmed | InProgress
/// ```
///
/// `Completed` is strictly terminal; `Cancelled` and `NoShow` permit the
/// unusual "reopen" transition back to a reserving status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created but not yet confirmed; holds no ledger capacity
    Pending,
    /// Confirmed by the driver; occupies capacity
    Confirmed,
    /// Charging session underway; occupies capacity
    InProgress,
    /// Session finished; capacity returned
    Completed,
    /// Withdrawn before or after confirmation; capacity returned
    Cancelled,
    /// Driver never arrived; capacity returned
    NoShow,
}

/// Capacity classification of a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    /// Occupies no ledger capacity (but counts against admission)
    Neutral,
    /// Currently occupies capacity
    Reserving,
    /// Has released (or never took) its capacity; lifecycle over
    Freeing,
}

impl BookingStatus {
    /// Every status, in lifecycle order. Useful for exhaustive table tests.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::NoShow,
    ];

    /// Capacity classification for this status.
    #[must_use]
    pub const fn class(self) -> StatusClass {
        match self {
            Self::Pending => StatusClass::Neutral,
            Self::Confirmed | Self::InProgress => StatusClass::Reserving,
            Self::Completed | Self::Cancelled | Self::NoShow => StatusClass::Freeing,
        }
    }

    /// True when the status currently occupies ledger capacity.
    #[must_use]
    pub const fn is_reserving(self) -> bool {
        matches!(self.class(), StatusClass::Reserving)
    }

    /// True when the status has released its capacity.
    #[must_use]
    pub const fn is_freeing(self) -> bool {
        matches!(self.class(), StatusClass::Freeing)
    }

    /// True when no transition out of this status is ever legal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Same-status pairs are rejected: a no-op is not a transition. The
    /// business time-window rules (advance limits, cutoffs) are applied
    /// separately by the [`crate::policy::TransitionGuard`] collaborator.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Confirmed | Self::InProgress | Self::Cancelled
            ) | (
                Self::Confirmed,
                Self::InProgress | Self::Completed | Self::Cancelled | Self::NoShow
            ) | (Self::InProgress, Self::Completed | Self::Cancelled | Self::NoShow)
                | (Self::Cancelled | Self::NoShow, Self::Confirmed | Self::InProgress)
        )
    }

    /// Stable textual form, used for persistence and wire payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for BookingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "no_show" => Ok(Self::NoShow),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Signed capacity delta implied by a status transition.
///
/// Positive means capacity freed, negative means capacity consumed. The
/// function is pure and total over all 36 status pairs:
///
/// | old → new | delta |
/// |---|---|
/// | reserving → freeing | `+slots_requested` |
/// | neutral → reserving | `-slots_requested` |
/// | freeing → reserving (reopen) | `-slots_requested` |
/// | any other pair | `0` |
///
/// Creation counts as `∅ → Pending` and therefore has no capacity effect.
#[must_use]
pub const fn capacity_delta(old: BookingStatus, new: BookingStatus, slots_requested: u32) -> i64 {
    match (old.class(), new.class()) {
        (StatusClass::Reserving, StatusClass::Freeing) => slots_requested as i64,
        (StatusClass::Neutral | StatusClass::Freeing, StatusClass::Reserving) => {
            -(slots_requested as i64)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::BookingStatus::{
        Cancelled, Completed, Confirmed, InProgress, NoShow, Pending,
    };
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(Pending.class(), StatusClass::Neutral);
        assert_eq!(Confirmed.class(), StatusClass::Reserving);
        assert_eq!(InProgress.class(), StatusClass::Reserving);
        assert_eq!(Completed.class(), StatusClass::Freeing);
        assert_eq!(Cancelled.class(), StatusClass::Freeing);
        assert_eq!(NoShow.class(), StatusClass::Freeing);
    }

    #[test]
    fn delta_matches_table_for_every_pair() {
        for old in BookingStatus::ALL {
            for new in BookingStatus::ALL {
                let expected = match (old.class(), new.class()) {
                    (StatusClass::Reserving, StatusClass::Freeing) => 3,
                    (StatusClass::Neutral | StatusClass::Freeing, StatusClass::Reserving) => -3,
                    _ => 0,
                };
                assert_eq!(
                    capacity_delta(old, new, 3),
                    expected,
                    "delta({old}, {new})"
                );
            }
        }
    }

    #[test]
    fn same_status_pairs_are_zero_and_illegal() {
        for status in BookingStatus::ALL {
            assert_eq!(capacity_delta(status, status, 5), 0);
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn completed_is_terminal_for_every_target() {
        for target in BookingStatus::ALL {
            assert!(!Completed.can_transition_to(target));
        }
    }

    #[test]
    fn pending_reaches_only_confirmed_in_progress_cancelled() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(NoShow));
    }

    #[test]
    fn reopen_is_legal_from_cancelled_and_no_show_only() {
        for freed in [Cancelled, NoShow] {
            assert!(freed.can_transition_to(Confirmed));
            assert!(freed.can_transition_to(InProgress));
            assert!(!freed.can_transition_to(Pending));
            assert!(!freed.can_transition_to(Completed));
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("charging".parse::<BookingStatus>().is_err());
    }
}
