//! Station store over `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use voltbook_core::{Station, StationId, StationStore, StoreError, StoreResult};

/// Row shape of the `stations` table.
#[derive(Debug, sqlx::FromRow)]
struct StationRow {
    station_id: Uuid,
    name: String,
    total_slots: i32,
    available_slots: i32,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StationRow> for Station {
    type Error = StoreError;

    fn try_from(row: StationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StationId::from_uuid(row.station_id),
            name: row.name,
            total_slots: to_count(row.total_slots)?,
            available_slots: to_count(row.available_slots)?,
            is_active: row.is_active,
            updated_at: row.updated_at,
        })
    }
}

fn to_count(value: i32) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Backend(format!("negative slot count {value}")))
}

fn from_count(value: u32) -> i32 {
    // Slot counts are tiny in practice; saturate rather than wrap.
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// `PostgreSQL`-backed station store.
#[derive(Clone)]
pub struct PgStationStore {
    pool: Arc<PgPool>,
}

impl PgStationStore {
    /// Creates a store over a connection pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }
}

#[async_trait]
impl StationStore for PgStationStore {
    async fn get(&self, id: StationId) -> StoreResult<Option<Station>> {
        let row: Option<StationRow> = sqlx::query_as(
            "SELECT station_id, name, total_slots, available_slots, is_active, updated_at
             FROM stations
             WHERE station_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to fetch station: {e}")))?;

        row.map(Station::try_from).transpose()
    }

    async fn put(&self, station: Station) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO stations (station_id, name, total_slots, available_slots, is_active, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (station_id) DO UPDATE SET
                 name = EXCLUDED.name,
                 total_slots = EXCLUDED.total_slots,
                 available_slots = EXCLUDED.available_slots,
                 is_active = EXCLUDED.is_active,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(station.id.as_uuid())
        .bind(&station.name)
        .bind(from_count(station.total_slots))
        .bind(from_count(station.available_slots))
        .bind(station.is_active)
        .bind(station.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed to upsert station: {e}")))?;

        Ok(())
    }

    async fn conditional_update_capacity(
        &self,
        id: StationId,
        expected_available: u32,
        new_available: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE stations
             SET available_slots = $3, updated_at = $4
             WHERE station_id = $1 AND available_slots = $2",
        )
        .bind(id.as_uuid())
        .bind(from_count(expected_available))
        .bind(from_count(new_available))
        .bind(updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed conditional capacity update: {e}")))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        tracing::debug!(
            station = %id,
            expected = expected_available,
            "conditional capacity update matched no row"
        );

        // Zero rows: either the precondition failed or the station is gone.
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM stations WHERE station_id = $1)")
                .bind(id.as_uuid())
                .fetch_one(self.pool.as_ref())
                .await
                .map_err(|e| StoreError::Backend(format!("failed existence check: {e}")))?;
        if exists.0 {
            Ok(false)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn overwrite_capacity(
        &self,
        id: StationId,
        new_available: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE stations
             SET available_slots = $2, updated_at = $3
             WHERE station_id = $1",
        )
        .bind(id.as_uuid())
        .bind(from_count(new_available))
        .bind(updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Backend(format!("failed capacity overwrite: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
