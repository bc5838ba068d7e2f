//! Reservation management endpoints.
//!
//! - `POST /api/reservations` - create a reservation
//! - `GET  /api/reservations/:id` - fetch one booking
//! - `GET  /api/reservations?owner=<uuid>` - list an owner's bookings
//! - `POST /api/reservations/:id/status` - transition the booking status
//! - `POST /api/reservations/:id/cancel` - cancel (status sugar)

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voltbook_core::{Booking, BookingId, BookingStatus, OwnerId, StationId};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a new reservation.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    /// Station to reserve at
    pub station_id: Uuid,
    /// Account making the reservation
    pub owner_id: Uuid,
    /// Slot start instant (must be a calendar grid start, UTC)
    pub reservation_time: DateTime<Utc>,
    /// Charging points requested; defaults to 1
    #[serde(default = "default_slots")]
    pub slots_requested: u32,
}

const fn default_slots() -> u32 {
    1
}

/// One booking, as returned by every reservation endpoint.
#[derive(Debug, Serialize)]
pub struct BookingView {
    /// Booking ID
    pub id: Uuid,
    /// Owner account
    pub owner_id: Uuid,
    /// Station
    pub station_id: Uuid,
    /// Slot start
    pub reservation_time: DateTime<Utc>,
    /// Slot end
    pub slot_end_time: DateTime<Utc>,
    /// Display label of the slot
    pub slot: String,
    /// Charging points occupied
    pub slots_requested: u32,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl BookingView {
    fn render(state: &AppState, booking: Booking) -> Self {
        let calendar = state.coordinator.calendar();
        Self {
            id: *booking.id.as_uuid(),
            owner_id: *booking.owner.as_uuid(),
            station_id: *booking.station_id.as_uuid(),
            slot_end_time: voltbook_core::TimeSlotCalendar::end_time(booking.reservation_time),
            slot: calendar.display_name(booking.reservation_time),
            reservation_time: booking.reservation_time,
            slots_requested: booking.slots_requested,
            status: booking.status,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Response after creating a reservation.
#[derive(Debug, Serialize)]
pub struct CreateReservationResponse {
    /// The created booking
    pub booking: BookingView,
    /// Slots still open at that time after this reservation
    pub available: u32,
}

/// Request to transition a booking's status.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target status
    pub status: BookingStatus,
}

/// Response after a status transition.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    /// The booking with its new status
    pub booking: BookingView,
    /// Slots returned to the station by this transition
    pub slots_freed: u32,
    /// Slots taken from the station by this transition
    pub slots_reserved: u32,
    /// Human-readable summary of the capacity effect
    pub message: String,
}

/// Request to reschedule a reservation.
#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    /// New slot start, if changing
    pub reservation_time: Option<DateTime<Utc>>,
    /// New station, if changing
    pub station_id: Option<Uuid>,
}

/// Query parameters for listing reservations.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Owner account to list bookings for
    pub owner: Uuid,
}

/// Response for the owner listing.
#[derive(Debug, Serialize)]
pub struct ListReservationsResponse {
    /// The owner's bookings, newest first
    pub reservations: Vec<BookingView>,
    /// Total count
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new reservation.
///
/// The booking is persisted `Pending`; capacity is consumed on
/// confirmation.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<CreateReservationResponse>), AppError> {
    if request.slots_requested == 0 {
        return Err(AppError::bad_request("slots_requested must be at least 1"));
    }

    let created = state
        .coordinator
        .create(
            StationId::from_uuid(request.station_id),
            OwnerId::from_uuid(request.owner_id),
            request.reservation_time,
            request.slots_requested,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReservationResponse {
            available: created.available,
            booking: BookingView::render(&state, created.booking),
        }),
    ))
}

/// Get one booking by ID.
pub async fn get_reservation(
    Path(booking_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state
        .coordinator
        .booking(BookingId::from_uuid(booking_id))
        .await?;
    Ok(Json(BookingView::render(&state, booking)))
}

/// List bookings for an owner, newest first.
pub async fn list_reservations(
    Query(query): Query<ListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListReservationsResponse>, AppError> {
    let bookings = state
        .coordinator
        .bookings_for_owner(OwnerId::from_uuid(query.owner))
        .await?;
    let reservations: Vec<BookingView> = bookings
        .into_iter()
        .map(|b| BookingView::render(&state, b))
        .collect();
    Ok(Json(ListReservationsResponse {
        total: reservations.len(),
        reservations,
    }))
}

/// Transition a booking to a new status, applying the implied capacity
/// delta.
pub async fn transition_status(
    Path(booking_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let outcome = state
        .coordinator
        .change_status(BookingId::from_uuid(booking_id), request.status)
        .await?;

    Ok(Json(TransitionResponse {
        slots_freed: outcome.slots_freed,
        slots_reserved: outcome.slots_reserved,
        message: outcome.summary,
        booking: BookingView::render(&state, outcome.booking),
    }))
}

/// Cancel a booking.
pub async fn cancel_reservation(
    Path(booking_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<TransitionResponse>, AppError> {
    let outcome = state
        .coordinator
        .cancel(BookingId::from_uuid(booking_id))
        .await?;

    Ok(Json(TransitionResponse {
        slots_freed: outcome.slots_freed,
        slots_reserved: outcome.slots_reserved,
        message: outcome.summary,
        booking: BookingView::render(&state, outcome.booking),
    }))
}

/// Move a booking to a new time and/or station.
pub async fn reschedule_reservation(
    Path(booking_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<BookingView>, AppError> {
    if request.reservation_time.is_none() && request.station_id.is_none() {
        return Err(AppError::bad_request(
            "provide reservation_time and/or station_id",
        ));
    }

    let booking = state
        .coordinator
        .reschedule(
            BookingId::from_uuid(booking_id),
            request.reservation_time,
            request.station_id.map(StationId::from_uuid),
        )
        .await?;
    Ok(Json(BookingView::render(&state, booking)))
}
