#![allow(dead_code)] // each test binary uses a different slice of the harness

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use roomledger_api::db::{establish_connection_with_config, run_migrations, DbConfig, DbPool};
use roomledger_api::entities::rate_plan::PlanType;
use roomledger_api::entities::{inventory_record, property, rate_plan, room};
use roomledger_api::events::{process_events, EventSender};
use roomledger_api::handlers::AppServices;
use roomledger_api::tenant::TenantId;

/// Test harness over an in-memory SQLite database with migrations applied
/// and one tenant/property/room seeded.
///
/// The pool is capped at a single connection: with `sqlite::memory:` every
/// pooled connection would otherwise get its own empty database.
pub struct TestContext {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub event_sender: EventSender,
    pub tenant: TenantId,
    pub property_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestContext {
    pub async fn new() -> Self {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let db = establish_connection_with_config(&config)
            .await
            .expect("db connect");
        run_migrations(&db).await.expect("migrations");
        let db = Arc::new(db);

        let (tx, rx) = mpsc::channel(100);
        let sender = EventSender::new(tx);
        let event_task = tokio::spawn(process_events(rx));

        let services = AppServices::new(db.clone(), sender.clone());

        let tenant = TenantId(Uuid::new_v4());
        let property_id = seed_property(&db, tenant, "Harborview Hotel", "Lisbon", "PT").await;

        Self {
            db,
            services,
            event_sender: sender,
            tenant,
            property_id,
            _event_task: event_task,
        }
    }

    /// Adds a second property for cross-property assertions.
    pub async fn seed_property(&self, name: &str, city: &str, country: &str) -> Uuid {
        seed_property(&self.db, self.tenant, name, city, country).await
    }

    pub async fn seed_room(&self, property_id: Uuid, name: &str, total_units: i32) -> Uuid {
        let id = Uuid::new_v4();
        room::ActiveModel {
            id: Set(id),
            tenant_id: Set(self.tenant.as_uuid()),
            property_id: Set(property_id),
            name: Set(name.to_string()),
            room_type: Set("double".to_string()),
            max_adults: Set(2),
            max_occupancy: Set(4),
            total_units: Set(total_units),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("seed room");
        id
    }

    pub async fn seed_standard_plan(&self, property_id: Uuid, base_price: Decimal) -> Uuid {
        self.seed_plan(property_id, "Standard Rate", base_price, false, None)
            .await
    }

    pub async fn seed_dynamic_plan(
        &self,
        property_id: Uuid,
        base_price: Decimal,
        rules: serde_json::Value,
    ) -> Uuid {
        self.seed_plan(property_id, "Dynamic Rate", base_price, true, Some(rules))
            .await
    }

    async fn seed_plan(
        &self,
        property_id: Uuid,
        name: &str,
        base_price: Decimal,
        is_dynamic: bool,
        rules: Option<serde_json::Value>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        rate_plan::ActiveModel {
            id: Set(id),
            tenant_id: Set(self.tenant.as_uuid()),
            property_id: Set(property_id),
            name: Set(name.to_string()),
            plan_type: Set(if is_dynamic {
                PlanType::Dynamic
            } else {
                PlanType::Standard
            }
            .as_str()
            .to_string()),
            base_price: Set(base_price),
            currency: Set("USD".to_string()),
            is_dynamic: Set(is_dynamic),
            dynamic_rules: Set(rules),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("seed rate plan");
        id
    }

    /// Reads one inventory record back for assertions.
    pub async fn inventory_on(
        &self,
        room_id: Uuid,
        rate_plan_id: Uuid,
        date: NaiveDate,
    ) -> inventory_record::Model {
        inventory_record::Entity::find()
            .filter(inventory_record::Column::RoomId.eq(room_id))
            .filter(inventory_record::Column::RatePlanId.eq(rate_plan_id))
            .filter(inventory_record::Column::Date.eq(date))
            .one(&*self.db)
            .await
            .expect("query inventory")
            .expect("inventory record present")
    }
}

async fn seed_property(
    db: &Arc<DbPool>,
    tenant: TenantId,
    name: &str,
    city: &str,
    country: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    property::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant.as_uuid()),
        name: Set(name.to_string()),
        city: Set(city.to_string()),
        country: Set(country.to_string()),
        rating: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(&**db)
    .await
    .expect("seed property");
    id
}

/// A check-in date comfortably in the future, so cancellation restores every
/// night of the stay.
pub fn future_date(days_ahead: i64) -> NaiveDate {
    Utc::now().date_naive() + ChronoDuration::days(days_ahead)
}
