use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    BookingCreated {
        booking_id: Uuid,
        property_id: Uuid,
        room_id: Uuid,
        rate_plan_id: Uuid,
        rooms: i32,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    BookingCancelled {
        booking_id: Uuid,
        restored_nights: u32,
    },
    InventoryUpdated {
        record_id: Uuid,
        available_rooms: i32,
    },
    InventoryProvisioned {
        property_id: Uuid,
        room_id: Uuid,
        created: u64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Downstream consumers
/// (channel sync, notifications) subscribe here once they exist.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::BookingCreated {
                booking_id,
                rooms,
                check_in,
                check_out,
                ..
            } => {
                info!(
                    booking_id = %booking_id,
                    rooms = %rooms,
                    check_in = %check_in,
                    check_out = %check_out,
                    "Booking created"
                );
            }
            Event::BookingCancelled {
                booking_id,
                restored_nights,
            } => {
                info!(
                    booking_id = %booking_id,
                    restored_nights = %restored_nights,
                    "Booking cancelled"
                );
            }
            Event::InventoryUpdated {
                record_id,
                available_rooms,
            } => {
                info!(
                    record_id = %record_id,
                    available_rooms = %available_rooms,
                    "Inventory updated"
                );
            }
            Event::InventoryProvisioned {
                property_id,
                room_id,
                created,
            } => {
                info!(
                    property_id = %property_id,
                    room_id = %room_id,
                    created = %created,
                    "Inventory provisioned"
                );
            }
        }
    }
}
