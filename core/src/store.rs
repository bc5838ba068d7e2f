//! Persistence contracts consumed by the engine.
//!
//! The engine never talks to a database directly; it issues typed point
//! reads and writes against these two traits. `voltbook-postgres` implements
//! them over sqlx, `voltbook-testing` over in-memory maps.

use crate::status::BookingStatus;
use crate::types::{Booking, BookingId, OwnerId, Station, StationId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Persistence-layer failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write targeted a record that does not exist.
    #[error("record not found")]
    NotFound,

    /// Backend failure (connection, query, serialization).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Station records, read and written only for their capacity fields.
#[async_trait]
pub trait StationStore: Send + Sync {
    /// Fetch a station by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on persistence failure.
    async fn get(&self, id: StationId) -> StoreResult<Option<Station>>;

    /// Insert or replace a station record. Used for registration and tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on persistence failure.
    async fn put(&self, station: Station) -> StoreResult<()>;

    /// Conditionally write the capacity counter: the write commits only if
    /// the stored `available_slots` still equals `expected_available`.
    /// Returns `false` when the precondition failed (someone else won the
    /// race); the caller re-reads and retries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the station disappeared and
    /// [`StoreError::Backend`] on persistence failure.
    async fn conditional_update_capacity(
        &self,
        id: StationId,
        expected_available: u32,
        new_available: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Unconditionally overwrite the capacity counter. Reserved for the
    /// auditor's repair path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the station does not exist and
    /// [`StoreError::Backend`] on persistence failure.
    async fn overwrite_capacity(
        &self,
        id: StationId,
        new_available: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;
}

/// Booking records. Bookings are never deleted; cancellation is a status.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Fetch a booking by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on persistence failure.
    async fn get(&self, id: BookingId) -> StoreResult<Option<Booking>>;

    /// Persist a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on persistence failure.
    async fn insert(&self, booking: Booking) -> StoreResult<()>;

    /// Persist a status change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the booking does not exist and
    /// [`StoreError::Backend`] on persistence failure.
    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Persist a reschedule (new station and/or reservation time).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the booking does not exist and
    /// [`StoreError::Backend`] on persistence failure.
    async fn update_target(
        &self,
        id: BookingId,
        station_id: StationId,
        reservation_time: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Sum of `slots_requested` over bookings at `(station_id, time)` whose
    /// status is not freeing, optionally excluding one booking id (used when
    /// re-checking an in-flight update against its own reservation).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on persistence failure.
    async fn sum_outstanding_slots_at(
        &self,
        station_id: StationId,
        time: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> StoreResult<u32>;

    /// Sum of `slots_requested` over bookings at the station whose status is
    /// reserving. Feeds the auditor's from-scratch recomputation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on persistence failure.
    async fn sum_reserving_slots(&self, station_id: StationId) -> StoreResult<u32>;

    /// All bookings belonging to an owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on persistence failure.
    async fn list_for_owner(&self, owner: OwnerId) -> StoreResult<Vec<Booking>>;
}
