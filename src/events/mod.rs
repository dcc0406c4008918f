use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{OrderStatus, PaymentStatus};

/// Things that happened to a transaction, published after the change commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TransactionCreated {
        transaction_id: Uuid,
        queue_code: String,
        total_price: String,
        occurred_at: DateTime<Utc>,
    },
    OrderStatusChanged {
        transaction_id: Uuid,
        queue_code: String,
        old_status: OrderStatus,
        new_status: OrderStatus,
        occurred_at: DateTime<Utc>,
    },
    PaymentStatusChanged {
        transaction_id: Uuid,
        old_status: PaymentStatus,
        new_status: PaymentStatus,
        occurred_at: DateTime<Utc>,
    },
}

impl Event {
    pub fn transaction_id(&self) -> Uuid {
        match self {
            Self::TransactionCreated { transaction_id, .. }
            | Self::OrderStatusChanged { transaction_id, .. }
            | Self::PaymentStatusChanged { transaction_id, .. } => *transaction_id,
        }
    }
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

    /// Creates a bounded channel and the sender that feeds it
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when nobody is listening.
    /// The state change behind the event has already committed.
    pub async fn publish(&self, event: Event) {
        let transaction_id = event.transaction_id();
        if let Err(e) = self.send(event).await {
            warn!(%transaction_id, error = %e, "Dropped domain event");
        }
    }
}

/// Drains the channel until every sender is gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::TransactionCreated {
                transaction_id,
                queue_code,
                total_price,
                ..
            } => {
                info!(%transaction_id, %queue_code, %total_price, "Transaction created");
            }
            Event::OrderStatusChanged {
                transaction_id,
                queue_code,
                old_status,
                new_status,
                ..
            } => {
                info!(
                    %transaction_id,
                    %queue_code,
                    %old_status,
                    %new_status,
                    "Order status changed"
                );
            }
            Event::PaymentStatusChanged {
                transaction_id,
                old_status,
                new_status,
                ..
            } => {
                info!(%transaction_id, %old_status, %new_status, "Payment status changed");
            }
        }
    }

    info!("Event processing loop stopped");
}
