use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sellable capacity for one room type under one rate plan on one calendar
/// date. Unique per (tenant_id, room_id, rate_plan_id, date); the synthetic id
/// exists only as the primary key. Invariant: 0 <= available_rooms <=
/// total_rooms.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub room_id: Uuid,
    pub rate_plan_id: Uuid,
    pub date: NaiveDate,
    pub available_rooms: i32,
    pub total_rooms: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    pub currency: String,
    pub min_stay: Option<i32>,
    pub closed_to_arrival: bool,
    pub closed_to_departure: bool,
    pub stop_sell: bool,
    /// Open map of extra rule flags from channel managers.
    pub restrictions: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Availability a seller may actually offer; stop-sell forces zero
    /// regardless of the stored count.
    pub fn effective_available(&self) -> i32 {
        if self.stop_sell {
            0
        } else {
            self.available_rooms
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::room::Entity",
        from = "Column::RoomId",
        to = "super::room::Column::Id"
    )]
    Room,
    #[sea_orm(
        belongs_to = "super::rate_plan::Entity",
        from = "Column::RatePlanId",
        to = "super::rate_plan::Column::Id"
    )]
    RatePlan,
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl Related<super::rate_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RatePlan.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);

            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
        }

        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}
