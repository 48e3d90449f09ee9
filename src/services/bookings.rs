//! Booking Commit
//!
//! Persists a new booking and consumes inventory for every night of the stay
//! inside one database transaction. The availability check and the decrement
//! are a single conditional UPDATE with an affected-row check, so two
//! concurrent bookings can never jointly overdraw a night. Cancellation is
//! symmetric: it restores the consumed units for the nights that have not yet
//! elapsed.

use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{
    booking::{self, BookingStatus, Entity as BookingEntity, PaymentStatus},
    inventory_record::{self, Entity as InventoryRecordEntity},
    rate_plan::{self, Entity as RatePlanEntity},
    room::{self, Entity as RoomEntity},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::availability::stay_nights;
use crate::services::pricing::{self, PricingContext};
use crate::tenant::TenantId;

lazy_static! {
    static ref BOOKING_COMMITS: IntCounter = IntCounter::new(
        "booking_commits_total",
        "Total number of committed bookings"
    )
    .expect("metric can be created");
    static ref BOOKING_COMMIT_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "booking_commit_failures_total",
            "Total number of failed booking commits"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
    static ref BOOKING_CANCELLATIONS: IntCounter = IntCounter::new(
        "booking_cancellations_total",
        "Total number of cancelled bookings"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookingInput {
    pub property_id: Uuid,
    pub room_id: Uuid,
    pub rate_plan_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub guest_name: String,
    #[validate(email)]
    pub guest_email: String,
    #[validate(length(max = 40))]
    pub guest_phone: Option<String>,
    pub check_in: NaiveDate,
    /// Exclusive; must be strictly after check_in.
    pub check_out: NaiveDate,
    #[validate(range(min = 1, max = 50))]
    pub rooms: i32,
    #[validate(range(min = 1, max = 20))]
    pub adults: i32,
    #[validate(range(min = 0, max = 20))]
    pub children: i32,
    #[validate(length(max = 2000))]
    pub special_requests: Option<String>,
    /// Signals for dynamic-price recomputation; totals are always computed
    /// server-side, never taken from the client.
    #[serde(default)]
    pub pricing: PricingContext,
}

/// Booking as returned to API callers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_reference: String,
    pub property_id: Uuid,
    pub room_id: Uuid,
    pub rate_plan_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: i32,
    pub adults: i32,
    pub children: i32,
    pub total_nights: i32,
    pub base_price: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
}

impl From<booking::Model> for BookingResponse {
    fn from(model: booking::Model) -> Self {
        Self {
            id: model.id,
            booking_reference: model.booking_reference,
            property_id: model.property_id,
            room_id: model.room_id,
            rate_plan_id: model.rate_plan_id,
            guest_name: model.guest_name,
            guest_email: model.guest_email,
            check_in: model.check_in,
            check_out: model.check_out,
            rooms: model.rooms,
            adults: model.adults,
            children: model.children,
            total_nights: model.total_nights,
            base_price: model.base_price,
            total_amount: model.total_amount,
            currency: model.currency,
            status: model.status,
            payment_status: model.payment_status,
        }
    }
}

/// Service for committing, querying, and cancelling bookings.
#[derive(Clone)]
pub struct BookingService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl BookingService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a booking and decrements availability for every night of the
    /// stay, atomically. Either the booking row and all decrements commit
    /// together, or none of them do.
    #[instrument(skip(self, input), fields(room_id = %input.room_id, check_in = %input.check_in))]
    pub async fn create_booking(
        &self,
        tenant: TenantId,
        input: CreateBookingInput,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;

        input.validate().map_err(|e| {
            BOOKING_COMMIT_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            ServiceError::ValidationError(format!("Invalid booking input: {}", e))
        })?;
        if input.check_out <= input.check_in {
            BOOKING_COMMIT_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            return Err(ServiceError::ValidationError(
                "check_out must be after check_in; zero-night stays are invalid".to_string(),
            ));
        }

        let room = RoomEntity::find_by_id(input.room_id)
            .filter(room::Column::TenantId.eq(tenant.as_uuid()))
            .filter(room::Column::PropertyId.eq(input.property_id))
            .filter(room::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Room {} not found", input.room_id)))?;

        if input.adults > room.max_adults || input.adults + input.children > room.max_occupancy {
            BOOKING_COMMIT_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            return Err(ServiceError::ValidationError(format!(
                "Occupancy exceeds room capacity ({} adults / {} total)",
                room.max_adults, room.max_occupancy
            )));
        }

        let plan = RatePlanEntity::find_by_id(input.rate_plan_id)
            .filter(rate_plan::Column::TenantId.eq(tenant.as_uuid()))
            .filter(rate_plan::Column::PropertyId.eq(input.property_id))
            .filter(rate_plan::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Rate plan {} not found", input.rate_plan_id))
            })?;

        let nights = stay_nights(input.check_in, input.check_out);

        let booked = self
            .commit_in_transaction(db, tenant, &input, &plan, &nights)
            .await
            .map_err(|e| {
                let err = match e {
                    TransactionError::Connection(db_err) => {
                        ServiceError::BookingCommitFailed(db_err.to_string())
                    }
                    TransactionError::Transaction(ServiceError::Conflict(msg)) => {
                        ServiceError::Conflict(msg)
                    }
                    TransactionError::Transaction(other) => {
                        ServiceError::BookingCommitFailed(other.to_string())
                    }
                };
                BOOKING_COMMIT_FAILURES
                    .with_label_values(&[match err {
                        ServiceError::Conflict(_) => "conflict",
                        _ => "commit_failed",
                    }])
                    .inc();
                err
            })?;

        BOOKING_COMMITS.inc();
        info!(
            booking_id = %booked.id,
            booking_reference = %booked.booking_reference,
            total_amount = %booked.total_amount,
            "Booking committed"
        );

        self.event_sender
            .send(Event::BookingCreated {
                booking_id: booked.id,
                property_id: booked.property_id,
                room_id: booked.room_id,
                rate_plan_id: booked.rate_plan_id,
                rooms: booked.rooms,
                check_in: booked.check_in,
                check_out: booked.check_out,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(BookingResponse::from(booked))
    }

    async fn commit_in_transaction(
        &self,
        db: &DatabaseConnection,
        tenant: TenantId,
        input: &CreateBookingInput,
        plan: &rate_plan::Model,
        nights: &[NaiveDate],
    ) -> Result<booking::Model, TransactionError<ServiceError>> {
        let input = input.clone();
        let plan = plan.clone();
        let nights = nights.to_vec();
        db.transaction::<_, booking::Model, ServiceError>(move |txn| {
            let input = input.clone();
            let plan = plan.clone();
            let nights = nights.clone();
            Box::pin(async move {
                let records = InventoryRecordEntity::find()
                    .filter(inventory_record::Column::TenantId.eq(tenant.as_uuid()))
                    .filter(inventory_record::Column::RoomId.eq(input.room_id))
                    .filter(inventory_record::Column::RatePlanId.eq(input.rate_plan_id))
                    .filter(inventory_record::Column::Date.gte(nights[0]))
                    .filter(inventory_record::Column::Date.lt(input.check_out))
                    .order_by_asc(inventory_record::Column::Date)
                    .all(txn)
                    .await?;

                if records.len() != nights.len() {
                    return Err(ServiceError::Conflict(
                        "Room is not sellable for every night of the stay".to_string(),
                    ));
                }

                // Server-side price recomputation; client totals are ignored.
                let mut nightly_total = Decimal::ZERO;
                let mut base_price = Decimal::ZERO;
                for (i, record) in records.iter().enumerate() {
                    let price = pricing::nightly_price(record.price, &plan, &input.pricing)?;
                    if i == 0 {
                        base_price = price;
                    }
                    nightly_total += price;
                }
                let total_amount = nightly_total * Decimal::from(input.rooms);

                // The availability check and decrement are one conditional
                // UPDATE per night; zero affected rows means someone else got
                // the inventory first and the whole transaction rolls back.
                for record in &records {
                    let result = InventoryRecordEntity::update_many()
                        .col_expr(
                            inventory_record::Column::AvailableRooms,
                            Expr::col(inventory_record::Column::AvailableRooms)
                                .sub(input.rooms),
                        )
                        .col_expr(
                            inventory_record::Column::UpdatedAt,
                            Expr::value(Utc::now()),
                        )
                        .filter(inventory_record::Column::Id.eq(record.id))
                        .filter(inventory_record::Column::AvailableRooms.gte(input.rooms))
                        .filter(inventory_record::Column::StopSell.eq(false))
                        .exec(txn)
                        .await?;

                    if result.rows_affected == 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Room no longer available for {}",
                            record.date
                        )));
                    }
                }

                let total_nights = nights.len() as i32;
                let make_row = |reference: String| booking::ActiveModel {
                    tenant_id: Set(tenant.as_uuid()),
                    property_id: Set(input.property_id),
                    room_id: Set(input.room_id),
                    rate_plan_id: Set(input.rate_plan_id),
                    booking_reference: Set(reference),
                    guest_name: Set(input.guest_name.clone()),
                    guest_email: Set(input.guest_email.clone()),
                    guest_phone: Set(input.guest_phone.clone()),
                    check_in: Set(input.check_in),
                    check_out: Set(input.check_out),
                    rooms: Set(input.rooms),
                    adults: Set(input.adults),
                    children: Set(input.children),
                    total_nights: Set(total_nights),
                    base_price: Set(base_price),
                    total_amount: Set(total_amount),
                    currency: Set(plan.currency.clone()),
                    status: Set(BookingStatus::Confirmed.as_str().to_string()),
                    payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
                    special_requests: Set(input.special_requests.clone()),
                    ..Default::default()
                };

                let reference = generate_booking_reference();
                match make_row(reference.clone()).insert(txn).await {
                    Ok(model) => Ok(model),
                    // One retry on a reference collision; the random suffix
                    // makes a second collision implausible.
                    Err(e) if is_unique_violation(&e) => {
                        warn!(reference = %reference, "Booking reference collision, regenerating");
                        make_row(generate_booking_reference())
                            .insert(txn)
                            .await
                            .map_err(ServiceError::DatabaseError)
                    }
                    Err(e) => Err(ServiceError::DatabaseError(e)),
                }
            })
        })
        .await
    }

    /// Cancels a confirmed booking and restores the consumed units for every
    /// night that has not yet elapsed. Past nights stay consumed.
    #[instrument(skip(self))]
    pub async fn cancel_booking(
        &self,
        tenant: TenantId,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;
        let today = Utc::now().date_naive();

        let cancelled = db
            .transaction::<_, (booking::Model, u32), ServiceError>(|txn| {
                Box::pin(async move {
                    let existing = BookingEntity::find_by_id(booking_id)
                        .filter(booking::Column::TenantId.eq(tenant.as_uuid()))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Booking {} not found", booking_id))
                        })?;

                    match BookingStatus::from_str(&existing.status) {
                        Some(BookingStatus::Confirmed) => {}
                        Some(BookingStatus::Cancelled) => {
                            return Err(ServiceError::ValidationError(
                                "Booking is already cancelled".to_string(),
                            ));
                        }
                        _ => {
                            return Err(ServiceError::ValidationError(format!(
                                "Cannot cancel a booking in status {}",
                                existing.status
                            )));
                        }
                    }

                    let mut restored = 0u32;
                    for night in stay_nights(existing.check_in, existing.check_out) {
                        if night < today {
                            continue;
                        }
                        restored += restore_night(txn, &existing, night).await?;
                    }

                    let mut active: booking::ActiveModel = existing.into();
                    active.status = Set(BookingStatus::Cancelled.as_str().to_string());
                    let updated = active.update(txn).await?;

                    Ok((updated, restored))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        let (updated, restored_nights) = cancelled;

        BOOKING_CANCELLATIONS.inc();
        info!(
            booking_id = %updated.id,
            restored_nights = restored_nights,
            "Booking cancelled"
        );

        self.event_sender
            .send(Event::BookingCancelled {
                booking_id: updated.id,
                restored_nights,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(BookingResponse::from(updated))
    }

    /// Gets a booking by ID.
    #[instrument(skip(self))]
    pub async fn get_booking(
        &self,
        tenant: TenantId,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;

        let model = BookingEntity::find_by_id(booking_id)
            .filter(booking::Column::TenantId.eq(tenant.as_uuid()))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))?;

        Ok(BookingResponse::from(model))
    }

    /// Gets a booking by its human-readable reference.
    #[instrument(skip(self))]
    pub async fn get_booking_by_reference(
        &self,
        tenant: TenantId,
        reference: &str,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;

        let model = BookingEntity::find()
            .filter(booking::Column::TenantId.eq(tenant.as_uuid()))
            .filter(booking::Column::BookingReference.eq(reference))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", reference)))?;

        Ok(BookingResponse::from(model))
    }

    /// Lists bookings with pagination and an optional status filter.
    #[instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        tenant: TenantId,
        page: u64,
        limit: u64,
        status_filter: Option<BookingStatus>,
    ) -> Result<(Vec<BookingResponse>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if limit == 0 || limit > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let mut query =
            BookingEntity::find().filter(booking::Column::TenantId.eq(tenant.as_uuid()));
        if let Some(status) = status_filter {
            query = query.filter(booking::Column::Status.eq(status.as_str()));
        }
        query = query.order_by_desc(booking::Column::CreatedAt);

        let paginator = query.paginate(db, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok((models.into_iter().map(BookingResponse::from).collect(), total))
    }
}

/// Conditional re-increment for one night, capped at total_rooms so the
/// invariant survives manual inventory edits made after the booking. Returns
/// 1 when the night was restored.
async fn restore_night<C: ConnectionTrait>(
    txn: &C,
    booked: &booking::Model,
    night: NaiveDate,
) -> Result<u32, ServiceError> {
    let result = InventoryRecordEntity::update_many()
        .col_expr(
            inventory_record::Column::AvailableRooms,
            Expr::col(inventory_record::Column::AvailableRooms).add(booked.rooms),
        )
        .col_expr(
            inventory_record::Column::UpdatedAt,
            Expr::value(Utc::now()),
        )
        .filter(inventory_record::Column::TenantId.eq(booked.tenant_id))
        .filter(inventory_record::Column::RoomId.eq(booked.room_id))
        .filter(inventory_record::Column::RatePlanId.eq(booked.rate_plan_id))
        .filter(inventory_record::Column::Date.eq(night))
        .filter(
            Expr::col(inventory_record::Column::AvailableRooms)
                .lte(Expr::col(inventory_record::Column::TotalRooms).sub(booked.rooms)),
        )
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            booking_id = %booked.id,
            night = %night,
            "Skipped restoring a night: record missing or restore would exceed total_rooms"
        );
        return Ok(0);
    }
    Ok(1)
}

/// Human-readable reference, unique per tenant: epoch millis plus a random
/// alphanumeric suffix.
fn generate_booking_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("BK-{}{}", Utc::now().timestamp_millis(), suffix)
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    err.to_string().to_lowercase().contains("unique")
}
