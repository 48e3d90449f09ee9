use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::inventory::{BulkInventoryUpdate, UpdateInventoryInput};
use crate::tenant::TenantId;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct InventoryDateQuery {
    pub property_id: Uuid,
    pub room_id: Option<Uuid>,
    pub rate_plan_id: Option<Uuid>,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    pub property_id: Uuid,
    pub updates: Vec<BulkInventoryUpdate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProvisionRequest {
    pub property_id: Uuid,
    pub room_id: Uuid,
    pub rate_plan_ids: Vec<Uuid>,
    pub start_date: NaiveDate,
    pub days: u32,
}

/// Create the inventory router
pub fn inventory_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_inventory_by_date))
        .route("/:id", put(update_inventory))
        .route("/bulk", post(bulk_update_inventory))
        .route("/provision", post(provision_inventory))
}

/// List inventory records for one date, optionally narrowed by room or plan.
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryDateQuery),
    responses(
        (status = 200, description = "Inventory records for the date"),
        (status = 404, description = "Property not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory_by_date(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<InventoryDateQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state
        .services
        .inventory
        .get_by_date(
            tenant,
            query.property_id,
            query.room_id,
            query.rate_plan_id,
            query.date,
        )
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

/// Apply a partial update to one inventory record.
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    request_body = UpdateInventoryInput,
    responses(
        (status = 200, description = "Updated record"),
        (status = 400, description = "Update violates the availability invariant", body = crate::errors::ErrorResponse),
        (status = 404, description = "Record not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateInventoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state.services.inventory.update(tenant, id, input).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// Apply a batch of updates best-effort; the response carries one outcome per
/// item rather than failing the whole batch.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/bulk",
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "Per-item outcomes"),
        (status = 404, description = "Property not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn bulk_update_inventory(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcomes = state
        .services
        .inventory
        .bulk_update(tenant, request.property_id, request.updates)
        .await?;
    Ok(Json(ApiResponse::success(outcomes)))
}

/// Create the rolling window of records for a room across rate plans.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/provision",
    request_body = ProvisionRequest,
    responses(
        (status = 200, description = "Created/skipped counts"),
        (status = 400, description = "Window too large", body = crate::errors::ErrorResponse),
        (status = 404, description = "Property, room, or plan not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn provision_inventory(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(request): Json<ProvisionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    if request.days > state.config.provision_max_days {
        return Err(ServiceError::ValidationError(format!(
            "days must not exceed {}",
            state.config.provision_max_days
        )));
    }
    let result = state
        .services
        .inventory
        .provision_range(
            tenant,
            request.property_id,
            request.room_id,
            &request.rate_plan_ids,
            request.start_date,
            request.days,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
