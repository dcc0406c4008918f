//! Payment gateway boundary.
//!
//! The orchestrator talks to the gateway through [`PaymentGateway`]: once to
//! obtain a redirect link for a freshly created transaction and once per
//! asynchronous notification to interpret the reported status.

pub mod signature;
pub mod snap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::transaction::Model as TransactionModel;
use crate::errors::ServiceError;
use crate::models::PaymentStatus;

pub use signature::{notification_signature, verify_notification};
pub use snap::SnapGateway;

/// Asynchronous status notification posted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_status: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers the transaction with the gateway and returns the payment link.
    async fn process_payment(&self, transaction: &TransactionModel) -> Result<String, ServiceError>;

    /// Interprets a notification for `transaction_id` as a payment status.
    async fn hook_payment(
        &self,
        transaction_id: Uuid,
        notification: &PaymentNotification,
    ) -> Result<PaymentStatus, ServiceError>;
}

/// Maps a gateway `transaction_status` onto [`PaymentStatus`].
///
/// A `capture` the fraud screen flagged as `challenge` is not money yet and
/// stays pending until a follow-up notification settles it.
pub fn interpret_status(notification: &PaymentNotification) -> Result<PaymentStatus, ServiceError> {
    let status: PaymentStatus = notification.transaction_status.parse()?;
    match (status, notification.fraud_status.as_deref()) {
        (PaymentStatus::Capture, Some("challenge")) => Ok(PaymentStatus::Pending),
        (status, _) => Ok(status),
    }
}
