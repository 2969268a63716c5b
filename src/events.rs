use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::models::OrderStatus;

/// Events emitted by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: i32,
        order_ref: String,
    },
    OrderStatusChanged {
        order_id: i32,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
}

/// Cloneable handle used by services to publish events.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel for the lifetime of the application.
///
/// Order events currently only feed the structured log; the kitchen display
/// and notification integrations consume them from here when enabled.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                order_ref,
            } => {
                info!(order_id, order_ref = %order_ref, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id, old_status = %old_status, new_status = %new_status, "order status changed");
            }
        }
    }
}
