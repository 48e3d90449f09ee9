mod common;

use rust_decimal_macros::dec;
use serde_json::json;

use roomledger_api::services::availability::{SortBy, SortOrder, StaySearchRequest};
use roomledger_api::services::inventory::UpdateInventoryInput;
use roomledger_api::services::pricing::{DemandLevel, PricingContext, Season};

use common::{future_date, TestContext};

fn request(ctx: &TestContext, nights: i64) -> StaySearchRequest {
    StaySearchRequest {
        check_in: future_date(30),
        check_out: future_date(30 + nights),
        adults: 2,
        children: 0,
        rooms: 1,
        property_id: Some(ctx.property_id),
        city: None,
        country: None,
        room_type: None,
        min_price: None,
        max_price: None,
        sort_by: SortBy::default(),
        sort_order: SortOrder::default(),
        pricing: PricingContext::default(),
    }
}

async fn seeded(ctx: &TestContext, units: i32) -> (uuid::Uuid, uuid::Uuid) {
    let room_id = ctx.seed_room(ctx.property_id, "Garden Twin", units).await;
    let plan_id = ctx.seed_standard_plan(ctx.property_id, dec!(100.00)).await;
    ctx.services
        .inventory
        .provision_range(ctx.tenant, ctx.property_id, room_id, &[plan_id], future_date(28), 10)
        .await
        .expect("provision");
    (room_id, plan_id)
}

async fn set_night(
    ctx: &TestContext,
    room_id: uuid::Uuid,
    plan_id: uuid::Uuid,
    offset: i64,
    input: UpdateInventoryInput,
) {
    let record = ctx.inventory_on(room_id, plan_id, future_date(offset)).await;
    ctx.services
        .inventory
        .update(ctx.tenant, record.id, input)
        .await
        .expect("update night");
}

#[tokio::test]
async fn exact_availability_boundary() {
    let ctx = TestContext::new().await;
    let (_room, _plan) = seeded(&ctx, 2).await;

    // available == requested satisfies the stay
    let mut req = request(&ctx, 2);
    req.rooms = 2;
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].min_available_rooms, 2);

    // available == requested - 1 excludes it
    let mut req = request(&ctx, 2);
    req.rooms = 3;
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert!(options.is_empty());
}

#[tokio::test]
async fn stop_sell_hides_the_candidate_entirely() {
    let ctx = TestContext::new().await;
    let (room_id, plan_id) = seeded(&ctx, 5).await;

    set_night(
        &ctx,
        room_id,
        plan_id,
        31,
        UpdateInventoryInput {
            stop_sell: Some(true),
            ..Default::default()
        },
    )
    .await;

    // Night 31 is inside the stay: no partial matches.
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 3))
        .await
        .expect("search");
    assert!(options.is_empty());

    // A stay that ends before the stopped night is unaffected.
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 1))
        .await
        .expect("search");
    assert_eq!(options.len(), 1);
}

#[tokio::test]
async fn arrival_and_departure_closures() {
    let ctx = TestContext::new().await;
    let (room_id, plan_id) = seeded(&ctx, 5).await;

    // Closed to arrival on the check-in night blocks the stay.
    set_night(
        &ctx,
        room_id,
        plan_id,
        30,
        UpdateInventoryInput {
            closed_to_arrival: Some(true),
            ..Default::default()
        },
    )
    .await;
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 2))
        .await
        .expect("search");
    assert!(options.is_empty());

    // Shifting the stay to start a day later sidesteps the closure.
    let mut req = request(&ctx, 2);
    req.check_in = future_date(31);
    req.check_out = future_date(33);
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert_eq!(options.len(), 1);

    // Closed to departure on the last occupied night blocks that stay.
    set_night(
        &ctx,
        room_id,
        plan_id,
        32,
        UpdateInventoryInput {
            closed_to_departure: Some(true),
            ..Default::default()
        },
    )
    .await;
    let mut req = request(&ctx, 2);
    req.check_in = future_date(31);
    req.check_out = future_date(33);
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert!(options.is_empty());
}

#[tokio::test]
async fn min_stay_excludes_short_stays() {
    let ctx = TestContext::new().await;
    let (room_id, plan_id) = seeded(&ctx, 5).await;

    set_night(
        &ctx,
        room_id,
        plan_id,
        30,
        UpdateInventoryInput {
            min_stay: Some(3),
            ..Default::default()
        },
    )
    .await;

    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 2))
        .await
        .expect("search");
    assert!(options.is_empty());

    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 3))
        .await
        .expect("search");
    assert_eq!(options.len(), 1);
}

#[tokio::test]
async fn unprovisioned_night_excludes_the_candidate() {
    let ctx = TestContext::new().await;
    let room_id = ctx.seed_room(ctx.property_id, "Garden Twin", 5).await;
    let plan_id = ctx.seed_standard_plan(ctx.property_id, dec!(100.00)).await;
    // Window covers only the first two nights of a three-night stay.
    ctx.services
        .inventory
        .provision_range(ctx.tenant, ctx.property_id, room_id, &[plan_id], future_date(30), 2)
        .await
        .expect("provision");

    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 3))
        .await
        .expect("search");
    assert!(options.is_empty());

    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 2))
        .await
        .expect("search");
    assert_eq!(options.len(), 1);
}

#[tokio::test]
async fn dynamic_plan_prices_through_the_calculator_in_search() {
    let ctx = TestContext::new().await;
    let room_id = ctx.seed_room(ctx.property_id, "Garden Twin", 5).await;
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
    ctx.services
        .inventory
        .provision_range(ctx.tenant, ctx.property_id, room_id, &[plan_id], future_date(28), 10)
        .await
        .expect("provision");

    let mut req = request(&ctx, 2);
    req.pricing = PricingContext {
        demand_level: DemandLevel::High,
        season: Season::HighSeason,
        occupancy_rate: dec!(0.5),
    };
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert_eq!(options.len(), 1);
    // 100 * 1.2 * 1.1 per night
    assert_eq!(options[0].avg_price, dec!(132.00));
    assert_eq!(options[0].total_price, dec!(264.00));

    // With default signals (medium demand, normal season) no multiplier
    // matches and the stored price passes through.
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, request(&ctx, 2))
        .await
        .expect("search");
    assert_eq!(options[0].avg_price, dec!(100.00));
}

#[tokio::test]
async fn price_bounds_filter_on_average() {
    let ctx = TestContext::new().await;
    let (_room, _plan) = seeded(&ctx, 5).await;

    let mut req = request(&ctx, 2);
    req.max_price = Some(dec!(99.00));
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert!(options.is_empty());

    let mut req = request(&ctx, 2);
    req.min_price = Some(dec!(99.00));
    req.max_price = Some(dec!(101.00));
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert_eq!(options.len(), 1);
}

#[tokio::test]
async fn results_sort_deterministically_across_properties() {
    let ctx = TestContext::new().await;

    // Two properties, same nightly price: the name breaks the tie.
    let (_r1, _p1) = seeded(&ctx, 5).await; // "Harborview Hotel"
    let second = ctx.seed_property("Alpine Lodge", "Innsbruck", "AT").await;
    let room2 = ctx.seed_room(second, "Garden Twin", 5).await;
    let plan2 = ctx.seed_standard_plan(second, dec!(100.00)).await;
    ctx.services
        .inventory
        .provision_range(ctx.tenant, second, room2, &[plan2], future_date(28), 10)
        .await
        .expect("provision");

    let mut req = request(&ctx, 2);
    req.property_id = None;
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].property_name, "Alpine Lodge");
    assert_eq!(options[1].property_name, "Harborview Hotel");
}

#[tokio::test]
async fn occupancy_filters_out_small_rooms() {
    let ctx = TestContext::new().await;
    let (_room, _plan) = seeded(&ctx, 5).await; // max_adults 2, max_occupancy 4

    let mut req = request(&ctx, 2);
    req.adults = 3;
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert!(options.is_empty());

    let mut req = request(&ctx, 2);
    req.adults = 2;
    req.children = 3;
    let options = ctx
        .services
        .availability
        .search(ctx.tenant, req)
        .await
        .expect("search");
    assert!(options.is_empty());
}
