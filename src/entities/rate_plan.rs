use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pricing policy kind for a rate plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    Standard,
    Member,
    Corporate,
    Promo,
    Dynamic,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Standard => "standard",
            PlanType::Member => "member",
            PlanType::Corporate => "corporate",
            PlanType::Promo => "promo",
            PlanType::Dynamic => "dynamic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(PlanType::Standard),
            "member" => Some(PlanType::Member),
            "corporate" => Some(PlanType::Corporate),
            "promo" => Some(PlanType::Promo),
            "dynamic" => Some(PlanType::Dynamic),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rate_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub plan_type: String, // Storing as string in DB, but will convert to/from enum
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub base_price: Decimal,
    pub currency: String,
    pub is_dynamic: bool,
    /// Serialized `DynamicRules`; ignored by the pricing calculator when
    /// `is_dynamic` is false.
    pub dynamic_rules: Option<Json>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id"
    )]
    Property,
    #[sea_orm(has_many = "super::inventory_record::Entity")]
    InventoryRecords,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::inventory_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
