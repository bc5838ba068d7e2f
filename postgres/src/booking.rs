//! Booking store over `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use voltbook_core::{
    Booking, BookingId, BookingStatus, BookingStore, OwnerId, StationId, StoreError, StoreResult,
};

/// Statuses that do not count as freed, as stored in the `status` column.
const OUTSTANDING_STATUSES: [&str; 3] = ["pending", "confirmed", "in_progress"];

/// Statuses that currently occupy ledger capacity.
const RESERVING_STATUSES: [&str; 2] = ["confirmed", "in_progress"];

/// Row shape of the `bookings` table.
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    booking_id: Uuid,
    owner_id: Uuid,
    station_id: Uuid,
    reservation_time: DateTime<Utc>,
    slots_requested: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Backend(format!("corrupt status column: {e}")))?;
        let slots_requested = u32::try_from(row.slots_requested)
            .map_err(|_| StoreError::Backend(format!("negative slot count {}", row.slots_requested)))?;
        Ok(Self {
            id: BookingId::from_uuid(row.booking_id),
            owner: OwnerId::from_uuid(row.owner_id),
            station_id: StationId::from_uuid(row.station_id),
            reservation_time: row.reservation_time,
            slots_requested,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `PostgreSQL`-backed booking store.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: Arc<PgPool>,
}

impl PgBookingStore {
    /// Creates a store over a connection pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Convert a `SUM` result (int8, possibly NULL) to a slot count.
fn sum_to_count(sum: Option<i64>) -> StoreResult<u32> {
    u32::try_from(sum.unwrap_or(0))
        .map_err(|_| StoreError::Backend("slot sum out of range".to_string()))
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn get(&self, id: BookingId) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(
            "SELECT booking_id, owner_id, station_id, reservation_time,
                    slots_requested, status, created_at, updated_at
             FROM bookings
             WHERE booking_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to fetch booking: {e}")))?;

        row.map(Booking::try_from).transpose()
    }

    async fn insert(&self, booking: Booking) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO bookings (booking_id, owner_id, station_id, reservation_time,
                                   slots_requested, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.owner.as_uuid())
        .bind(booking.station_id.as_uuid())
        .bind(booking.reservation_time)
        .bind(i32::try_from(booking.slots_requested).unwrap_or(i32::MAX))
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to insert booking: {e}")))?;

        Ok(())
    }

    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE bookings SET status = $2, updated_at = $3 WHERE booking_id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to update status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_target(
        &self,
        id: BookingId,
        station_id: StationId,
        reservation_time: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE bookings
             SET station_id = $2, reservation_time = $3, updated_at = $4
             WHERE booking_id = $1",
        )
        .bind(id.as_uuid())
        .bind(station_id.as_uuid())
        .bind(reservation_time)
        .bind(updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to update target: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn sum_outstanding_slots_at(
        &self,
        station_id: StationId,
        time: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> StoreResult<u32> {
        let sum: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(slots_requested)
             FROM bookings
             WHERE station_id = $1
               AND reservation_time = $2
               AND status = ANY($3)
               AND ($4::uuid IS NULL OR booking_id <> $4)",
        )
        .bind(station_id.as_uuid())
        .bind(time)
        .bind(OUTSTANDING_STATUSES.map(String::from).to_vec())
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to sum outstanding slots: {e}")))?;

        sum_to_count(sum.0)
    }

    async fn sum_reserving_slots(&self, station_id: StationId) -> StoreResult<u32> {
        let sum: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(slots_requested)
             FROM bookings
             WHERE station_id = $1 AND status = ANY($2)",
        )
        .bind(station_id.as_uuid())
        .bind(RESERVING_STATUSES.map(String::from).to_vec())
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to sum reserving slots: {e}")))?;

        sum_to_count(sum.0)
    }

    async fn list_for_owner(&self, owner: OwnerId) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT booking_id, owner_id, station_id, reservation_time,
                    slots_requested, status, created_at, updated_at
             FROM bookings
             WHERE owner_id = $1
             ORDER BY created_at DESC, booking_id DESC",
        )
        .bind(owner.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to list bookings: {e}")))?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
