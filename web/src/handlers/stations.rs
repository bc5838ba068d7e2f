//! Station endpoints owned by the reservation engine.
//!
//! - `POST /api/stations` - register a station (capacity seeded full)
//! - `POST /api/stations/:id/repair` - recompute capacity from bookings

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voltbook_core::{Station, StationId};

/// Request to register a charging station.
#[derive(Debug, Deserialize)]
pub struct RegisterStationRequest {
    /// Display name
    pub name: String,
    /// Physical charging-point capacity
    pub total_slots: u32,
}

/// Response after registering a station.
#[derive(Debug, Serialize)]
pub struct RegisterStationResponse {
    /// Assigned station ID
    pub station_id: Uuid,
    /// Display name
    pub name: String,
    /// Physical slot count
    pub total_slots: u32,
    /// Available count (seeded full)
    pub available_slots: u32,
}

/// Response after a capacity repair.
#[derive(Debug, Serialize)]
pub struct RepairResponse {
    /// Station ID
    pub station_id: Uuid,
    /// Recomputed available count
    pub available: u32,
    /// Physical slot count
    pub total: u32,
    /// Whether the cached counter disagreed and was repaired
    pub drift_repaired: bool,
}

/// Register a station with all slots available.
pub async fn register_station(
    State(state): State<AppState>,
    Json(request): Json<RegisterStationRequest>,
) -> Result<(StatusCode, Json<RegisterStationResponse>), AppError> {
    if request.total_slots == 0 {
        return Err(AppError::bad_request("total_slots must be at least 1"));
    }

    let station = Station::new(
        StationId::new(),
        request.name,
        request.total_slots,
        state.clock.now(),
    );
    let response = RegisterStationResponse {
        station_id: *station.id.as_uuid(),
        name: station.name.clone(),
        total_slots: station.total_slots,
        available_slots: station.available_slots,
    };
    state
        .stations
        .put(station)
        .await
        .map_err(voltbook_core::BookingError::from)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Recompute a station's capacity from its reserving bookings, repairing
/// any drift in the cached counter.
pub async fn repair_capacity(
    Path(station_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RepairResponse>, AppError> {
    let report = state
        .auditor
        .recompute(StationId::from_uuid(station_id))
        .await?;

    Ok(Json(RepairResponse {
        station_id,
        available: report.available,
        total: report.total,
        drift_repaired: report.drift_repaired,
    }))
}
