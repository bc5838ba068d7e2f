//! Availability query endpoints.
//!
//! Read-only queries; slightly stale results are acceptable here, the
//! authoritative check happens inside the coordinator's commit path.
//!
//! - `GET /api/stations/:id/availability?time=<rfc3339>` - one slot time
//! - `GET /api/stations/:id/availability/:date` - every slot of a date

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voltbook_core::StationId;

/// Query parameters for the single-slot availability endpoint.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Slot start instant to query
    pub time: DateTime<Utc>,
}

/// Availability of one station at one slot time.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Station ID
    pub station_id: Uuid,
    /// Queried slot start
    pub time: DateTime<Utc>,
    /// Physical slot count
    pub total: u32,
    /// Slots still open
    pub available: u32,
    /// Whether at least one slot is open
    pub is_available: bool,
}

/// One slot of the per-date availability listing.
#[derive(Debug, Serialize)]
pub struct SlotAvailabilityView {
    /// Slot start
    pub start_time: DateTime<Utc>,
    /// Slot end
    pub end_time: DateTime<Utc>,
    /// Display label
    pub slot: String,
    /// Slots still open
    pub available: u32,
    /// Whether at least one slot is open
    pub is_available: bool,
}

/// Response for the per-date availability listing.
#[derive(Debug, Serialize)]
pub struct DayAvailabilityResponse {
    /// Station ID
    pub station_id: Uuid,
    /// Queried date
    pub date: NaiveDate,
    /// Availability per slot, in grid order
    pub slots: Vec<SlotAvailabilityView>,
}

/// Availability at one station and slot time.
pub async fn get_availability(
    Path(station_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
    State(state): State<AppState>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let snapshot = state
        .resolver()
        .snapshot(StationId::from_uuid(station_id), query.time)
        .await?;

    Ok(Json(AvailabilityResponse {
        station_id,
        time: query.time,
        total: snapshot.total,
        available: snapshot.available,
        is_available: snapshot.is_available,
    }))
}

/// Availability for every slot of a date.
pub async fn get_day_availability(
    Path((station_id, date)): Path<(Uuid, NaiveDate)>,
    State(state): State<AppState>,
) -> Result<Json<DayAvailabilityResponse>, AppError> {
    let schedule = state
        .resolver()
        .day_schedule(StationId::from_uuid(station_id), date)
        .await?;

    let slots = schedule
        .into_iter()
        .map(|entry| SlotAvailabilityView {
            start_time: entry.slot.start_time,
            end_time: entry.slot.end_time(),
            slot: entry.slot.display_name,
            available: entry.available,
            is_available: entry.is_available,
        })
        .collect();

    Ok(Json(DayAvailabilityResponse {
        station_id,
        date,
        slots,
    }))
}
