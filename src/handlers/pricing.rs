use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::pricing::PricingContext;
use crate::tenant::TenantId;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PriceQuoteRequest {
    pub rate_plan_id: Uuid,
    #[serde(default)]
    pub context: PricingContext,
}

/// Create the pricing router
pub fn pricing_router() -> Router<AppState> {
    Router::new().route("/quote", post(quote_price))
}

/// Compute a dynamic price quote from a plan's stored rules. The rules are
/// always read from the plan, never taken from the request.
#[utoipa::path(
    post,
    path = "/api/v1/pricing/quote",
    request_body = PriceQuoteRequest,
    responses(
        (status = 200, description = "Quote with applied-adjustment echo"),
        (status = 400, description = "Plan is not dynamic", body = crate::errors::ErrorResponse),
        (status = 404, description = "Rate plan not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "pricing"
)]
pub async fn quote_price(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(request): Json<PriceQuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state
        .services
        .pricing
        .quote(tenant, request.rate_plan_id, request.context)
        .await?;
    Ok(Json(ApiResponse::success(quote)))
}
