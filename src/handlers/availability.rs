use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};

use crate::errors::ServiceError;
use crate::services::availability::StaySearchRequest;
use crate::tenant::TenantId;
use crate::{ApiResponse, AppState};

/// Create the availability router
pub fn availability_router() -> Router<AppState> {
    Router::new().route("/search", post(search_availability))
}

/// Search room/rate-plan combinations able to host the whole stay.
#[utoipa::path(
    post,
    path = "/api/v1/availability/search",
    request_body = StaySearchRequest,
    responses(
        (status = 200, description = "Matching stay options (possibly empty)"),
        (status = 400, description = "Invalid dates or occupancy", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "availability"
)]
pub async fn search_availability(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(request): Json<StaySearchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let options = state.services.availability.search(tenant, request).await?;
    Ok(Json(ApiResponse::success(options)))
}
