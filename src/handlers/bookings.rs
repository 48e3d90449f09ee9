use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::errors::ServiceError;
use crate::services::bookings::CreateBookingInput;
use crate::tenant::TenantId;
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct BookingListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// Create the bookings router
pub fn bookings_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/by-reference/:reference", get(get_booking_by_reference))
}

/// Commit a booking: price recomputation, reference generation, and the
/// per-night inventory decrement happen atomically server-side.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingInput,
    responses(
        (status = 200, description = "Booking confirmed"),
        (status = 400, description = "Invalid dates or occupancy", body = crate::errors::ErrorResponse),
        (status = 404, description = "Room or rate plan not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Room no longer available", body = crate::errors::ErrorResponse),
        (status = 500, description = "Booking commit failed and was rolled back", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(input): Json<CreateBookingInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.create_booking(tenant, input).await?;
    Ok(Json(ApiResponse::success(booking)))
}

/// List bookings with pagination and optional status filter.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Page of bookings"),
        (status = 400, description = "Invalid pagination or status", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let status_filter = query
        .status
        .as_deref()
        .map(|s| {
            BookingStatus::from_str(s).ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown booking status: {}", s))
            })
        })
        .transpose()?;

    let (items, total) = state
        .services
        .bookings
        .list_bookings(tenant, query.page, query.limit, status_filter)
        .await?;

    let total_pages = total.div_ceil(query.limit);
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page: query.page,
        limit: query.limit,
        total_pages,
    })))
}

/// Fetch one booking by id.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    responses(
        (status = 200, description = "Booking"),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.get_booking(tenant, id).await?;
    Ok(Json(ApiResponse::success(booking)))
}

/// Fetch one booking by its human-readable reference.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/by-reference/{reference}",
    responses(
        (status = 200, description = "Booking"),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn get_booking_by_reference(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state
        .services
        .bookings
        .get_booking_by_reference(tenant, &reference)
        .await?;
    Ok(Json(ApiResponse::success(booking)))
}

/// Cancel a confirmed booking, restoring inventory for the nights that have
/// not yet elapsed.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    responses(
        (status = 200, description = "Booking cancelled, inventory restored"),
        (status = 400, description = "Booking is not cancellable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.cancel_booking(tenant, id).await?;
    Ok(Json(ApiResponse::success(booking)))
}
