mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use serde_json::json;

use roomledger_api::errors::ServiceError;
use roomledger_api::services::pricing::{DemandLevel, PricingContext, Season};

use common::TestContext;

fn high_season_context() -> PricingContext {
    PricingContext {
        demand_level: DemandLevel::High,
        season: Season::HighSeason,
        occupancy_rate: dec!(0.5),
    }
}

#[tokio::test]
async fn quote_applies_stored_rules() {
    let ctx = TestContext::new().await;
    let plan_id = ctx
        .seed_dynamic_plan(
            ctx.property_id,
            dec!(100.00),
            json!({
                "demandMultipliers": { "high": "1.2" },
                "seasonMultipliers": { "high_season": "1.1" }
            }),
        )
        .await;

    let quote = ctx
        .services
        .pricing
        .quote(ctx.tenant, plan_id, high_season_context())
        .await
        .expect("quote");

    assert_eq!(quote.price, dec!(132.00));
    assert_eq!(quote.applied.demand_multiplier, Some(dec!(1.2)));
    assert_eq!(quote.applied.season_multiplier, Some(dec!(1.1)));
}

#[tokio::test]
async fn quote_clamps_to_min_price() {
    let ctx = TestContext::new().await;
    let plan_id = ctx
        .seed_dynamic_plan(
            ctx.property_id,
            dec!(100.00),
            json!({
                "demandMultipliers": { "high": "1.2" },
                "seasonMultipliers": { "high_season": "1.1" },
                "minPrice": "150"
            }),
        )
        .await;

    let quote = ctx
        .services
        .pricing
        .quote(ctx.tenant, plan_id, high_season_context())
        .await
        .expect("quote");

    assert_eq!(quote.price, dec!(150.00));
    assert_eq!(quote.applied.min_price, Some(dec!(150)));
}

#[tokio::test]
async fn non_dynamic_plans_are_rejected() {
    let ctx = TestContext::new().await;
    let plan_id = ctx.seed_standard_plan(ctx.property_id, dec!(100.00)).await;

    let result = ctx
        .services
        .pricing
        .quote(ctx.tenant, plan_id, PricingContext::default())
        .await;

    assert_matches!(result, Err(ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn unknown_plan_is_not_found() {
    let ctx = TestContext::new().await;
    let result = ctx
        .services
        .pricing
        .quote(ctx.tenant, uuid::Uuid::new_v4(), PricingContext::default())
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
}
