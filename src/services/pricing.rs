//! Dynamic pricing calculator.
//!
//! Pure multiplier-chain computation: base -> base multiplier -> demand ->
//! season -> occupancy -> min/max clamp -> half-up rounding. Absent rule keys
//! are identity; callers branch on `rate_plan.is_dynamic` upstream, so a
//! non-dynamic plan never reaches this module.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::rate_plan::{self, Entity as RatePlanEntity};
use crate::errors::ServiceError;
use crate::tenant::TenantId;

const LOW_OCCUPANCY_THRESHOLD: Decimal = dec!(0.3);
const HIGH_OCCUPANCY_THRESHOLD: Decimal = dec!(0.8);

/// Demand signal supplied by the caller (forecasting, channel manager).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DemandLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    LowSeason,
    #[default]
    Normal,
    HighSeason,
}

/// Occupancy-band adjustments. Low applies under 30% occupancy, high above
/// 80%; the 0.3-0.8 band gets no adjustment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OccupancyMultipliers {
    pub low_occupancy: Option<Decimal>,
    pub high_occupancy: Option<Decimal>,
}

/// Typed configuration stored on a dynamic rate plan. Wire format is
/// camelCase to stay compatible with channel-manager payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamicRules {
    pub base_multiplier: Option<Decimal>,
    pub demand_multipliers: HashMap<DemandLevel, Decimal>,
    pub season_multipliers: HashMap<Season, Decimal>,
    pub occupancy_multipliers: Option<OccupancyMultipliers>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Contextual signals for one price computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingContext {
    #[serde(default)]
    pub demand_level: DemandLevel,
    #[serde(default)]
    pub season: Season,
    /// Conventionally in [0, 1]; out-of-range values are passed through
    /// unvalidated and still hit the band comparisons.
    #[serde(default = "default_occupancy_rate")]
    pub occupancy_rate: Decimal,
}

fn default_occupancy_rate() -> Decimal {
    dec!(0.5)
}

impl Default for PricingContext {
    fn default() -> Self {
        Self {
            demand_level: DemandLevel::default(),
            season: Season::default(),
            occupancy_rate: default_occupancy_rate(),
        }
    }
}

/// Echo of the multipliers that were actually applied, for auditability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAdjustments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_multiplier: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_multiplier: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_multiplier: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_multiplier: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceQuote {
    pub price: Decimal,
    pub applied: AppliedAdjustments,
}

/// Computes the adjusted nightly price. Multiplier application order is
/// fixed: base -> demand -> season -> occupancy -> clamp -> round.
pub fn compute_dynamic_price(
    base_price: Decimal,
    rules: &DynamicRules,
    ctx: &PricingContext,
) -> PriceQuote {
    let mut price = base_price;
    let mut applied = AppliedAdjustments::default();

    if let Some(base) = rules.base_multiplier {
        price *= base;
        applied.base_multiplier = Some(base);
    }

    if let Some(demand) = rules.demand_multipliers.get(&ctx.demand_level) {
        price *= *demand;
        applied.demand_multiplier = Some(*demand);
    }

    if let Some(season) = rules.season_multipliers.get(&ctx.season) {
        price *= *season;
        applied.season_multiplier = Some(*season);
    }

    if let Some(occupancy) = &rules.occupancy_multipliers {
        if ctx.occupancy_rate < LOW_OCCUPANCY_THRESHOLD {
            if let Some(low) = occupancy.low_occupancy {
                price *= low;
                applied.occupancy_multiplier = Some(low);
            }
        } else if ctx.occupancy_rate > HIGH_OCCUPANCY_THRESHOLD {
            if let Some(high) = occupancy.high_occupancy {
                price *= high;
                applied.occupancy_multiplier = Some(high);
            }
        }
    }

    if let Some(min) = rules.min_price {
        if price < min {
            price = min;
            applied.min_price = Some(min);
        }
    }

    if let Some(max) = rules.max_price {
        if price > max {
            price = max;
            applied.max_price = Some(max);
        }
    }

    PriceQuote {
        price: price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        applied,
    }
}

/// Deserializes the rules stored on a plan; a dynamic plan without stored
/// rules behaves as an all-identity rule set.
pub fn rules_from_plan(plan: &rate_plan::Model) -> Result<DynamicRules, ServiceError> {
    match &plan.dynamic_rules {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            ServiceError::InternalError(format!(
                "Malformed dynamic rules on rate plan {}: {}",
                plan.id, e
            ))
        }),
        None => Ok(DynamicRules::default()),
    }
}

/// Quotes prices for stored rate plans.
#[derive(Clone)]
pub struct PricingService {
    db_pool: Arc<DatabaseConnection>,
}

impl PricingService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Computes a quote from a plan's stored base price and rules. Rejects
    /// non-dynamic plans: their price is the inventory record's stored value
    /// and never goes through the calculator.
    #[instrument(skip(self, ctx))]
    pub async fn quote(
        &self,
        tenant: TenantId,
        rate_plan_id: Uuid,
        ctx: PricingContext,
    ) -> Result<PriceQuote, ServiceError> {
        let db = &*self.db_pool;

        let plan = RatePlanEntity::find_by_id(rate_plan_id)
            .filter(rate_plan::Column::TenantId.eq(tenant.as_uuid()))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Rate plan {} not found", rate_plan_id))
            })?;

        if !plan.is_dynamic {
            return Err(ServiceError::InvalidOperation(format!(
                "Rate plan {} is not dynamic; its price comes from inventory records",
                rate_plan_id
            )));
        }

        let rules = rules_from_plan(&plan)?;
        Ok(compute_dynamic_price(plan.base_price, &rules, &ctx))
    }
}

/// Price for one night: the stored record price verbatim for non-dynamic
/// plans (exact round-trip), or the calculator output with the stored price
/// as base for dynamic plans.
pub fn nightly_price(
    stored_price: Decimal,
    plan: &rate_plan::Model,
    ctx: &PricingContext,
) -> Result<Decimal, ServiceError> {
    if !plan.is_dynamic {
        return Ok(stored_price);
    }
    let rules = rules_from_plan(plan)?;
    Ok(compute_dynamic_price(stored_price, &rules, ctx).price)
}
