//! Availability Search
//!
//! Given a stay request, returns every room/rate-plan combination that can
//! satisfy it for every night of the stay, with aggregated pricing. A
//! candidate missing any night, or tripping any sell restriction on any
//! night, is excluded entirely; there are no partial matches.

use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    inventory_record::{self, Entity as InventoryRecordEntity},
    property::{self, Entity as PropertyEntity},
    rate_plan::{self, Entity as RatePlanEntity},
    room::{self, Entity as RoomEntity},
};
use crate::errors::ServiceError;
use crate::services::pricing::{self, PricingContext};
use crate::tenant::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Price,
    Rating,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StaySearchRequest {
    pub check_in: NaiveDate,
    /// Exclusive; must be strictly after check_in.
    pub check_out: NaiveDate,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    #[serde(default = "default_rooms")]
    pub rooms: i32,
    pub property_id: Option<Uuid>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub room_type: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Signals fed to the dynamic pricing calculator for dynamic plans.
    #[serde(default)]
    pub pricing: PricingContext,
}

fn default_rooms() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NightlyPrice {
    pub date: NaiveDate,
    pub price: Decimal,
}

/// One room + rate plan able to host the whole stay. Ephemeral; never
/// persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StayOption {
    pub property_id: Uuid,
    pub property_name: String,
    pub property_rating: Option<Decimal>,
    pub room_id: Uuid,
    pub room_name: String,
    pub room_type: String,
    pub rate_plan_id: Uuid,
    pub rate_plan_name: String,
    pub is_dynamic: bool,
    pub currency: String,
    pub nights: u32,
    /// Mean nightly price, rounded half-up to 2 decimals.
    pub avg_price: Decimal,
    /// Cheapest night of the stay.
    pub min_price: Decimal,
    /// Most expensive night of the stay.
    pub max_price: Decimal,
    /// Sum of nightly prices times the requested room units.
    pub total_price: Decimal,
    pub min_available_rooms: i32,
    pub nightly_prices: Vec<NightlyPrice>,
}

/// Service answering stay-level availability queries.
#[derive(Clone)]
pub struct AvailabilityService {
    db_pool: Arc<DatabaseConnection>,
}

impl AvailabilityService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(check_in = %request.check_in, check_out = %request.check_out))]
    pub async fn search(
        &self,
        tenant: TenantId,
        request: StaySearchRequest,
    ) -> Result<Vec<StayOption>, ServiceError> {
        let db = &*self.db_pool;

        validate_request(&request)?;
        let nights = stay_nights(request.check_in, request.check_out);

        // Candidate properties
        let mut property_query = PropertyEntity::find()
            .filter(property::Column::TenantId.eq(tenant.as_uuid()))
            .filter(property::Column::IsActive.eq(true));
        if let Some(property_id) = request.property_id {
            property_query = property_query.filter(property::Column::Id.eq(property_id));
        }
        if let Some(city) = &request.city {
            property_query = property_query.filter(property::Column::City.eq(city.clone()));
        }
        if let Some(country) = &request.country {
            property_query =
                property_query.filter(property::Column::Country.eq(country.clone()));
        }
        let properties = property_query.all(db).await?;
        if properties.is_empty() {
            return Ok(Vec::new());
        }
        let property_ids: Vec<Uuid> = properties.iter().map(|p| p.id).collect();
        let properties_by_id: HashMap<Uuid, &property::Model> =
            properties.iter().map(|p| (p.id, p)).collect();

        // Candidate rooms, filtered by occupancy up front
        let mut room_query = RoomEntity::find()
            .filter(room::Column::TenantId.eq(tenant.as_uuid()))
            .filter(room::Column::PropertyId.is_in(property_ids.clone()))
            .filter(room::Column::IsActive.eq(true))
            .filter(room::Column::MaxAdults.gte(request.adults))
            .filter(room::Column::MaxOccupancy.gte(request.adults + request.children));
        if let Some(room_type) = &request.room_type {
            room_query = room_query.filter(room::Column::RoomType.eq(room_type.clone()));
        }
        let rooms = room_query.all(db).await?;
        if rooms.is_empty() {
            return Ok(Vec::new());
        }

        let plans = RatePlanEntity::find()
            .filter(rate_plan::Column::TenantId.eq(tenant.as_uuid()))
            .filter(rate_plan::Column::PropertyId.is_in(property_ids))
            .filter(rate_plan::Column::IsActive.eq(true))
            .all(db)
            .await?;
        if plans.is_empty() {
            return Ok(Vec::new());
        }

        // Whole date range for all candidate rooms in one query, then bucketed
        // per (room, plan).
        let room_ids: Vec<Uuid> = rooms.iter().map(|r| r.id).collect();
        let records = InventoryRecordEntity::find()
            .filter(inventory_record::Column::TenantId.eq(tenant.as_uuid()))
            .filter(inventory_record::Column::RoomId.is_in(room_ids))
            .filter(inventory_record::Column::Date.gte(request.check_in))
            .filter(inventory_record::Column::Date.lt(request.check_out))
            .all(db)
            .await?;

        let mut records_by_pair: HashMap<(Uuid, Uuid), HashMap<NaiveDate, inventory_record::Model>> =
            HashMap::new();
        for record in records {
            records_by_pair
                .entry((record.room_id, record.rate_plan_id))
                .or_default()
                .insert(record.date, record);
        }

        let mut options = Vec::new();
        for room in &rooms {
            for plan in plans.iter().filter(|p| p.property_id == room.property_id) {
                let Some(by_date) = records_by_pair.get(&(room.id, plan.id)) else {
                    continue;
                };
                let Some(stay) = collect_stay(by_date, &nights) else {
                    continue;
                };
                if violates_restrictions(&stay, request.rooms) {
                    continue;
                }

                let mut nightly = Vec::with_capacity(stay.len());
                for record in &stay {
                    let price = pricing::nightly_price(record.price, plan, &request.pricing)?;
                    nightly.push(NightlyPrice {
                        date: record.date,
                        price,
                    });
                }
                let prices: Vec<Decimal> = nightly.iter().map(|n| n.price).collect();
                let (avg_price, min_price, max_price, total_price) =
                    aggregate_pricing(&prices, request.rooms);

                if let Some(floor) = request.min_price {
                    if avg_price < floor {
                        continue;
                    }
                }
                if let Some(ceiling) = request.max_price {
                    if avg_price > ceiling {
                        continue;
                    }
                }

                let min_available_rooms = stay
                    .iter()
                    .map(|r| r.available_rooms)
                    .min()
                    .unwrap_or_default();

                // Properties map is keyed from the same result set the rooms
                // came from, so the lookup cannot miss.
                let prop = properties_by_id[&room.property_id];
                options.push(StayOption {
                    property_id: prop.id,
                    property_name: prop.name.clone(),
                    property_rating: prop.rating,
                    room_id: room.id,
                    room_name: room.name.clone(),
                    room_type: room.room_type.clone(),
                    rate_plan_id: plan.id,
                    rate_plan_name: plan.name.clone(),
                    is_dynamic: plan.is_dynamic,
                    currency: plan.currency.clone(),
                    nights: nights.len() as u32,
                    avg_price,
                    min_price,
                    max_price,
                    total_price,
                    min_available_rooms,
                    nightly_prices: nightly,
                });
            }
        }

        sort_options(&mut options, request.sort_by, request.sort_order);
        Ok(options)
    }
}

fn validate_request(request: &StaySearchRequest) -> Result<(), ServiceError> {
    if request.check_out <= request.check_in {
        return Err(ServiceError::ValidationError(
            "check_out must be after check_in; zero-night stays are invalid".to_string(),
        ));
    }
    if request.rooms < 1 {
        return Err(ServiceError::ValidationError(
            "rooms must be at least 1".to_string(),
        ));
    }
    if request.adults < 1 {
        return Err(ServiceError::ValidationError(
            "adults must be at least 1".to_string(),
        ));
    }
    if request.children < 0 {
        return Err(ServiceError::ValidationError(
            "children must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Nights of the stay: every date in [check_in, check_out).
pub(crate) fn stay_nights(check_in: NaiveDate, check_out: NaiveDate) -> Vec<NaiveDate> {
    let count = (check_out - check_in).num_days();
    (0..count).map(|i| check_in + Duration::days(i)).collect()
}

/// Pulls the stay's records in night order; None when any night is missing.
fn collect_stay<'a>(
    by_date: &'a HashMap<NaiveDate, inventory_record::Model>,
    nights: &[NaiveDate],
) -> Option<Vec<&'a inventory_record::Model>> {
    nights.iter().map(|night| by_date.get(night)).collect()
}

/// Restriction check over a complete, night-ordered stay. True when any
/// night excludes the candidate: stop-sell, insufficient availability,
/// closed-to-arrival on the first night, closed-to-departure on the departure
/// night (the last occupied night), or a min-stay longer than the stay.
pub(crate) fn violates_restrictions(
    stay: &[&inventory_record::Model],
    rooms_requested: i32,
) -> bool {
    let total_nights = stay.len() as i32;
    let last = stay.len() - 1;
    stay.iter().enumerate().any(|(i, record)| {
        record.stop_sell
            || record.available_rooms < rooms_requested
            || (i == 0 && record.closed_to_arrival)
            || (i == last && record.closed_to_departure)
            || record.min_stay.map_or(false, |min| total_nights < min)
    })
}

/// (avg, min, max, total) across nightly prices; total scales by room units.
pub(crate) fn aggregate_pricing(
    nightly: &[Decimal],
    rooms_requested: i32,
) -> (Decimal, Decimal, Decimal, Decimal) {
    let sum: Decimal = nightly.iter().copied().sum();
    let count = Decimal::from(nightly.len() as u64);
    let avg = (sum / count).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let min = nightly.iter().copied().min().unwrap_or_default();
    let max = nightly.iter().copied().max().unwrap_or_default();
    let total = sum * Decimal::from(rooms_requested);
    (avg, min, max, total)
}

/// Sorts by the requested key/order; ties always fall back to property name
/// ascending, then room and plan names, so result order is deterministic.
pub(crate) fn sort_options(options: &mut [StayOption], sort_by: SortBy, sort_order: SortOrder) {
    options.sort_by(|a, b| {
        let primary = match sort_by {
            SortBy::Price => a.avg_price.cmp(&b.avg_price),
            SortBy::Rating => a.property_rating.cmp(&b.property_rating),
            SortBy::Name => a.property_name.cmp(&b.property_name),
        };
        let primary = match sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary
            .then_with(|| a.property_name.cmp(&b.property_name))
            .then_with(|| a.room_name.cmp(&b.room_name))
            .then_with(|| a.rate_plan_name.cmp(&b.rate_plan_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn night(date: (i32, u32, u32), available: i32) -> inventory_record::Model {
        inventory_record::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            rate_plan_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            available_rooms: available,
            total_rooms: 10,
            price: dec!(100.00),
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

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stay_nights_excludes_checkout_date() {
        let nights = stay_nights(ymd(2026, 9, 14), ymd(2026, 9, 17));
        assert_eq!(
            nights,
            vec![ymd(2026, 9, 14), ymd(2026, 9, 15), ymd(2026, 9, 16)]
        );
    }

    #[test]
    fn exact_availability_satisfies_one_short_excludes() {
        let a = night((2026, 9, 14), 2);
        let b = night((2026, 9, 15), 2);
        assert!(!violates_restrictions(&[&a, &b], 2));
        assert!(violates_restrictions(&[&a, &b], 3));
    }

    #[test]
    fn stop_sell_on_any_night_excludes() {
        let a = night((2026, 9, 14), 5);
        let mut b = night((2026, 9, 15), 5);
        b.stop_sell = true;
        assert!(violates_restrictions(&[&a, &b], 1));
    }

    #[test]
    fn closed_to_arrival_only_matters_on_first_night() {
        let mut first = night((2026, 9, 14), 5);
        let mut middle = night((2026, 9, 15), 5);
        let last = night((2026, 9, 16), 5);

        middle.closed_to_arrival = true;
        assert!(!violates_restrictions(&[&first, &middle, &last], 1));

        first.closed_to_arrival = true;
        assert!(violates_restrictions(&[&first, &middle, &last], 1));
    }

    #[test]
    fn closed_to_departure_only_matters_on_departure_night() {
        let mut first = night((2026, 9, 14), 5);
        let mut last = night((2026, 9, 15), 5);

        first.closed_to_departure = true;
        assert!(!violates_restrictions(&[&first, &last], 1));

        first.closed_to_departure = false;
        last.closed_to_departure = true;
        assert!(violates_restrictions(&[&first, &last], 1));
    }

    #[test]
    fn min_stay_longer_than_stay_excludes() {
        let mut a = night((2026, 9, 14), 5);
        let b = night((2026, 9, 15), 5);
        a.min_stay = Some(3);
        assert!(violates_restrictions(&[&a, &b], 1));

        a.min_stay = Some(2);
        assert!(!violates_restrictions(&[&a, &b], 1));
    }

    #[test]
    fn missing_night_yields_no_stay() {
        let mut by_date = HashMap::new();
        let record = night((2026, 9, 14), 5);
        by_date.insert(record.date, record);
        let nights = vec![ymd(2026, 9, 14), ymd(2026, 9, 15)];
        assert!(collect_stay(&by_date, &nights).is_none());
    }

    #[test]
    fn two_night_aggregation_matches_stored_prices() {
        // 2 nights at 100.00, 1 room requested
        let prices = vec![dec!(100.00), dec!(100.00)];
        let (avg, min, max, total) = aggregate_pricing(&prices, 1);
        assert_eq!(avg, dec!(100.00));
        assert_eq!(min, dec!(100.00));
        assert_eq!(max, dec!(100.00));
        assert_eq!(total, dec!(200.00));
    }

    #[test]
    fn aggregation_scales_total_by_rooms_and_averages() {
        let prices = vec![dec!(90.00), dec!(110.00), dec!(100.00)];
        let (avg, min, max, total) = aggregate_pricing(&prices, 2);
        assert_eq!(avg, dec!(100.00));
        assert_eq!(min, dec!(90.00));
        assert_eq!(max, dec!(110.00));
        assert_eq!(total, dec!(600.00));
    }

    fn option_with(name: &str, avg: Decimal) -> StayOption {
        StayOption {
            property_id: Uuid::new_v4(),
            property_name: name.to_string(),
            property_rating: None,
            room_id: Uuid::new_v4(),
            room_name: "Double".to_string(),
            room_type: "double".to_string(),
            rate_plan_id: Uuid::new_v4(),
            rate_plan_name: "Standard".to_string(),
            is_dynamic: false,
            currency: "USD".to_string(),
            nights: 1,
            avg_price: avg,
            min_price: avg,
            max_price: avg,
            total_price: avg,
            min_available_rooms: 1,
            nightly_prices: vec![],
        }
    }

    #[test]
    fn sorting_breaks_price_ties_by_property_name() {
        let mut options = vec![
            option_with("Zeta Lodge", dec!(100)),
            option_with("Alpha Inn", dec!(100)),
            option_with("Midtown", dec!(90)),
        ];
        sort_options(&mut options, SortBy::Price, SortOrder::Asc);
        let names: Vec<&str> = options.iter().map(|o| o.property_name.as_str()).collect();
        assert_eq!(names, vec!["Midtown", "Alpha Inn", "Zeta Lodge"]);

        sort_options(&mut options, SortBy::Price, SortOrder::Desc);
        let names: Vec<&str> = options.iter().map(|o| o.property_name.as_str()).collect();
        // Descending by price, but the tie still resolves by name ascending.
        assert_eq!(names, vec!["Alpha Inn", "Zeta Lodge", "Midtown"]);
    }

    #[test]
    fn zero_night_stay_is_rejected() {
        let request = StaySearchRequest {
            check_in: ymd(2026, 9, 14),
            check_out: ymd(2026, 9, 14),
            adults: 2,
            children: 0,
            rooms: 1,
            property_id: None,
            city: None,
            country: None,
            room_type: None,
            min_price: None,
            max_price: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            pricing: PricingContext::default(),
        };
        assert!(matches!(
            validate_request(&request),
            Err(ServiceError::ValidationError(_))
        ));
    }
}
