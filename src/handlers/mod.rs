pub mod availability;
pub mod bookings;
pub mod health;
pub mod inventory;
pub mod pricing;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub availability: Arc<crate::services::availability::AvailabilityService>,
    pub bookings: Arc<crate::services::bookings::BookingService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub pricing: Arc<crate::services::pricing::PricingService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            availability: Arc::new(crate::services::availability::AvailabilityService::new(
                db_pool.clone(),
            )),
            bookings: Arc::new(crate::services::bookings::BookingService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            inventory: Arc::new(crate::services::inventory::InventoryService::new(
                db_pool.clone(),
                event_sender,
            )),
            pricing: Arc::new(crate::services::pricing::PricingService::new(db_pool)),
        }
    }
}
