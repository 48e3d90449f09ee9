use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;

use roomledger_api::services::pricing::{
    compute_dynamic_price, DemandLevel, DynamicRules, OccupancyMultipliers, PricingContext, Season,
};

fn full_rule_set() -> DynamicRules {
    let mut rules = DynamicRules {
        base_multiplier: Some(dec!(1.05)),
        occupancy_multipliers: Some(OccupancyMultipliers {
            low_occupancy: Some(dec!(0.9)),
            high_occupancy: Some(dec!(1.25)),
        }),
        min_price: Some(dec!(50)),
        max_price: Some(dec!(900)),
        ..Default::default()
    };
    rules.demand_multipliers.insert(DemandLevel::Low, dec!(0.95));
    rules.demand_multipliers.insert(DemandLevel::High, dec!(1.2));
    rules
        .season_multipliers
        .insert(Season::LowSeason, dec!(0.85));
    rules
        .season_multipliers
        .insert(Season::HighSeason, dec!(1.3));
    rules
}

fn dynamic_price_benchmark(c: &mut Criterion) {
    let rules = full_rule_set();
    let ctx = PricingContext {
        demand_level: DemandLevel::High,
        season: Season::HighSeason,
        occupancy_rate: dec!(0.85),
    };

    c.bench_function("compute_dynamic_price/full_rules", |b| {
        b.iter(|| compute_dynamic_price(black_box(dec!(129.50)), black_box(&rules), black_box(&ctx)))
    });

    let empty = DynamicRules::default();
    c.bench_function("compute_dynamic_price/identity_rules", |b| {
        b.iter(|| {
            compute_dynamic_price(
                black_box(dec!(129.50)),
                black_box(&empty),
                black_box(&PricingContext::default()),
            )
        })
    });
}

criterion_group!(benches, dynamic_price_benchmark);
criterion_main!(benches);
