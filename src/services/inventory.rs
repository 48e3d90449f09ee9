//! Inventory Record Store
//!
//! Durable storage and point lookups/updates for per-date availability and
//! price. Bulk updates are best-effort per item; provisioning creates the
//! rolling window of records at room/rate-plan setup time and is not part of
//! the booking hot path.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    inventory_record::{self, Entity as InventoryRecordEntity},
    property::{self, Entity as PropertyEntity},
    rate_plan::{self, Entity as RatePlanEntity},
    room::{self, Entity as RoomEntity},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::tenant::TenantId;

/// Hard upper bound on one provisioning call; per-deployment limits are
/// enforced at the HTTP boundary from config.
pub const MAX_PROVISION_DAYS: u32 = 3660;

/// Partial update for a single inventory record. Absent fields are left
/// untouched; a violating result is rejected, never clamped.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateInventoryInput {
    pub available_rooms: Option<i32>,
    pub price: Option<Decimal>,
    pub min_stay: Option<i32>,
    pub closed_to_arrival: Option<bool>,
    pub closed_to_departure: Option<bool>,
    pub stop_sell: Option<bool>,
}

/// One row of a bulk update request, addressed by the composite identity.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkInventoryUpdate {
    pub room_id: Uuid,
    pub rate_plan_id: Uuid,
    pub date: NaiveDate,
    pub available_rooms: Option<i32>,
    pub price: Option<Decimal>,
}

/// Per-item result of a bulk update. One item's failure never aborts the
/// remaining items.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkUpdateOutcome {
    pub room_id: Uuid,
    pub rate_plan_id: Uuid,
    pub date: NaiveDate,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProvisionResult {
    /// Records newly created by this call.
    pub created: u64,
    /// (rate plan, date) pairs that already had a record and were left alone.
    pub skipped: u64,
}

/// Service for managing per-date room inventory.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    /// Creates a new inventory service instance
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Fetches the records for one calendar date, optionally narrowed to a
    /// room and/or rate plan. Fails with NotFound when the property does not
    /// exist for the tenant.
    #[instrument(skip(self))]
    pub async fn get_by_date(
        &self,
        tenant: TenantId,
        property_id: Uuid,
        room_id: Option<Uuid>,
        rate_plan_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Vec<inventory_record::Model>, ServiceError> {
        let db = &*self.db_pool;

        self.require_property(tenant, property_id).await?;

        let mut query = InventoryRecordEntity::find()
            .filter(inventory_record::Column::TenantId.eq(tenant.as_uuid()))
            .filter(inventory_record::Column::PropertyId.eq(property_id))
            .filter(inventory_record::Column::Date.eq(date));

        if let Some(room_id) = room_id {
            query = query.filter(inventory_record::Column::RoomId.eq(room_id));
        }
        if let Some(rate_plan_id) = rate_plan_id {
            query = query.filter(inventory_record::Column::RatePlanId.eq(rate_plan_id));
        }

        let records = query
            .order_by_asc(inventory_record::Column::RoomId)
            .order_by_asc(inventory_record::Column::RatePlanId)
            .all(db)
            .await?;

        Ok(records)
    }

    /// Applies a partial update to exactly one record. The availability
    /// invariant (0 <= available <= total) is checked against the record's
    /// own total; violations are rejected with ValidationError.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        tenant: TenantId,
        record_id: Uuid,
        input: UpdateInventoryInput,
    ) -> Result<inventory_record::Model, ServiceError> {
        let db = &*self.db_pool;

        let record = InventoryRecordEntity::find_by_id(record_id)
            .filter(inventory_record::Column::TenantId.eq(tenant.as_uuid()))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory record {} not found", record_id))
            })?;

        validate_update(&record, &input)?;

        let mut active: inventory_record::ActiveModel = record.into();
        if let Some(available) = input.available_rooms {
            active.available_rooms = Set(available);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(min_stay) = input.min_stay {
            active.min_stay = Set(Some(min_stay));
        }
        if let Some(cta) = input.closed_to_arrival {
            active.closed_to_arrival = Set(cta);
        }
        if let Some(ctd) = input.closed_to_departure {
            active.closed_to_departure = Set(ctd);
        }
        if let Some(stop_sell) = input.stop_sell {
            active.stop_sell = Set(stop_sell);
        }

        let updated = active.update(db).await?;

        self.event_sender
            .send(Event::InventoryUpdated {
                record_id: updated.id,
                available_rooms: updated.available_rooms,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Applies each update independently and reports a per-item outcome list.
    /// Policy: best-effort, not all-or-nothing.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn bulk_update(
        &self,
        tenant: TenantId,
        property_id: Uuid,
        updates: Vec<BulkInventoryUpdate>,
    ) -> Result<Vec<BulkUpdateOutcome>, ServiceError> {
        self.require_property(tenant, property_id).await?;

        let mut outcomes = Vec::with_capacity(updates.len());
        for item in updates {
            let result = self.apply_bulk_item(tenant, property_id, &item).await;
            outcomes.push(match result {
                Ok(record_id) => BulkUpdateOutcome {
                    room_id: item.room_id,
                    rate_plan_id: item.rate_plan_id,
                    date: item.date,
                    success: true,
                    record_id: Some(record_id),
                    error: None,
                },
                Err(err) => {
                    warn!(
                        room_id = %item.room_id,
                        rate_plan_id = %item.rate_plan_id,
                        date = %item.date,
                        error = %err,
                        "Bulk inventory item failed"
                    );
                    BulkUpdateOutcome {
                        room_id: item.room_id,
                        rate_plan_id: item.rate_plan_id,
                        date: item.date,
                        success: false,
                        record_id: None,
                        error: Some(err.to_string()),
                    }
                }
            });
        }

        Ok(outcomes)
    }

    async fn apply_bulk_item(
        &self,
        tenant: TenantId,
        property_id: Uuid,
        item: &BulkInventoryUpdate,
    ) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;

        let record = InventoryRecordEntity::find()
            .filter(inventory_record::Column::TenantId.eq(tenant.as_uuid()))
            .filter(inventory_record::Column::PropertyId.eq(property_id))
            .filter(inventory_record::Column::RoomId.eq(item.room_id))
            .filter(inventory_record::Column::RatePlanId.eq(item.rate_plan_id))
            .filter(inventory_record::Column::Date.eq(item.date))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No inventory record for room {} plan {} on {}",
                    item.room_id, item.rate_plan_id, item.date
                ))
            })?;

        let input = UpdateInventoryInput {
            available_rooms: item.available_rooms,
            price: item.price,
            ..Default::default()
        };
        validate_update(&record, &input)?;

        let record_id = record.id;
        let mut active: inventory_record::ActiveModel = record.into();
        if let Some(available) = item.available_rooms {
            active.available_rooms = Set(available);
        }
        if let Some(price) = item.price {
            active.price = Set(price);
        }
        active.update(db).await?;

        Ok(record_id)
    }

    /// Creates one record per (rate plan x date) for a rolling window,
    /// seeding availability from the room's unit capacity and price from each
    /// plan's base price. Already-provisioned dates are skipped, not errors.
    #[instrument(skip(self, rate_plan_ids), fields(plans = rate_plan_ids.len()))]
    pub async fn provision_range(
        &self,
        tenant: TenantId,
        property_id: Uuid,
        room_id: Uuid,
        rate_plan_ids: &[Uuid],
        start_date: NaiveDate,
        days: u32,
    ) -> Result<ProvisionResult, ServiceError> {
        let db = &*self.db_pool;

        if days == 0 || days > MAX_PROVISION_DAYS {
            return Err(ServiceError::ValidationError(format!(
                "days must be between 1 and {}",
                MAX_PROVISION_DAYS
            )));
        }
        if rate_plan_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one rate plan is required".to_string(),
            ));
        }

        self.require_property(tenant, property_id).await?;

        let room = RoomEntity::find_by_id(room_id)
            .filter(room::Column::TenantId.eq(tenant.as_uuid()))
            .filter(room::Column::PropertyId.eq(property_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Room {} not found", room_id)))?;

        let plans = RatePlanEntity::find()
            .filter(rate_plan::Column::TenantId.eq(tenant.as_uuid()))
            .filter(rate_plan::Column::PropertyId.eq(property_id))
            .filter(rate_plan::Column::Id.is_in(rate_plan_ids.iter().copied()))
            .all(db)
            .await?;

        if plans.len() != rate_plan_ids.len() {
            let found: HashSet<Uuid> = plans.iter().map(|p| p.id).collect();
            let missing: Vec<String> = rate_plan_ids
                .iter()
                .filter(|id| !found.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(ServiceError::NotFound(format!(
                "Rate plan(s) not found: {}",
                missing.join(", ")
            )));
        }

        let end_date = start_date + Duration::days(i64::from(days));

        // Which (plan, date) slots already exist for this room?
        let existing: HashSet<(Uuid, NaiveDate)> = InventoryRecordEntity::find()
            .filter(inventory_record::Column::TenantId.eq(tenant.as_uuid()))
            .filter(inventory_record::Column::RoomId.eq(room_id))
            .filter(inventory_record::Column::RatePlanId.is_in(rate_plan_ids.iter().copied()))
            .filter(inventory_record::Column::Date.gte(start_date))
            .filter(inventory_record::Column::Date.lt(end_date))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.rate_plan_id, r.date))
            .collect();

        let now = Utc::now();
        let mut fresh = Vec::new();
        let mut skipped = 0u64;

        for plan in &plans {
            for offset in 0..i64::from(days) {
                let date = start_date + Duration::days(offset);
                if existing.contains(&(plan.id, date)) {
                    skipped += 1;
                    continue;
                }
                fresh.push(inventory_record::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(tenant.as_uuid()),
                    property_id: Set(property_id),
                    room_id: Set(room_id),
                    rate_plan_id: Set(plan.id),
                    date: Set(date),
                    available_rooms: Set(room.total_units),
                    total_rooms: Set(room.total_units),
                    price: Set(plan.base_price),
                    currency: Set(plan.currency.clone()),
                    min_stay: Set(None),
                    closed_to_arrival: Set(false),
                    closed_to_departure: Set(false),
                    stop_sell: Set(false),
                    restrictions: Set(None),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                });
            }
        }

        let created = fresh.len() as u64;
        if !fresh.is_empty() {
            InventoryRecordEntity::insert_many(fresh).exec(db).await?;
        }

        info!(
            room_id = %room_id,
            created = created,
            skipped = skipped,
            "Provisioned inventory window"
        );

        self.event_sender
            .send(Event::InventoryProvisioned {
                property_id,
                room_id,
                created,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ProvisionResult { created, skipped })
    }

    async fn require_property(
        &self,
        tenant: TenantId,
        property_id: Uuid,
    ) -> Result<property::Model, ServiceError> {
        let db = &*self.db_pool;
        PropertyEntity::find_by_id(property_id)
            .filter(property::Column::TenantId.eq(tenant.as_uuid()))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Property {} not found", property_id)))
    }
}

fn validate_update(
    record: &inventory_record::Model,
    input: &UpdateInventoryInput,
) -> Result<(), ServiceError> {
    if let Some(available) = input.available_rooms {
        if available < 0 || available > record.total_rooms {
            return Err(ServiceError::ValidationError(format!(
                "available_rooms must be within [0, {}], got {}",
                record.total_rooms, available
            )));
        }
    }
    if let Some(price) = input.price {
        if price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
    }
    if let Some(min_stay) = input.min_stay {
        if min_stay < 1 {
            return Err(ServiceError::ValidationError(
                "min_stay must be a positive number of nights".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn record(available: i32, total: i32) -> inventory_record::Model {
        inventory_record::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            rate_plan_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            available_rooms: available,
            total_rooms: total,
            price: dec!(100),
            currency: "USD".to_string(),
            min_stay: None,
            closed_to_arrival: false,
            closed_to_departure: false,
            stop_sell: false,
            restrictions: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn update_rejects_overdraw_and_negative() {
        let rec = record(5, 10);
        let over = UpdateInventoryInput {
            available_rooms: Some(11),
            ..Default::default()
        };
        assert_matches!(
            validate_update(&rec, &over),
            Err(ServiceError::ValidationError(_))
        );

        let negative = UpdateInventoryInput {
            available_rooms: Some(-1),
            ..Default::default()
        };
        assert_matches!(
            validate_update(&rec, &negative),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn update_accepts_boundary_values() {
        let rec = record(5, 10);
        for available in [0, 10] {
            let input = UpdateInventoryInput {
                available_rooms: Some(available),
                ..Default::default()
            };
            assert!(validate_update(&rec, &input).is_ok());
        }
    }

    #[test]
    fn update_rejects_negative_price_and_zero_min_stay() {
        let rec = record(5, 10);
        let bad_price = UpdateInventoryInput {
            price: Some(dec!(-0.01)),
            ..Default::default()
        };
        assert_matches!(
            validate_update(&rec, &bad_price),
            Err(ServiceError::ValidationError(_))
        );

        let bad_min_stay = UpdateInventoryInput {
            min_stay: Some(0),
            ..Default::default()
        };
        assert_matches!(
            validate_update(&rec, &bad_min_stay),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn stop_sell_forces_zero_effective_availability() {
        let mut rec = record(5, 10);
        assert_eq!(rec.effective_available(), 5);
        rec.stop_sell = true;
        assert_eq!(rec.effective_available(), 0);
    }
}
