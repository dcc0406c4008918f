use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{interpret_status, PaymentGateway, PaymentNotification};
use crate::config::AppConfig;
use crate::dto::format_amount;
use crate::entities::transaction::Model as TransactionModel;
use crate::errors::ServiceError;
use crate::models::PaymentStatus;

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    /// Exact total with two decimals; the stored total is never rounded away.
    gross_amount: String,
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[allow(dead_code)]
    token: Option<String>,
    redirect_url: String,
}

/// Adapter for a Snap-style hosted payment page.
#[derive(Debug, Clone)]
pub struct SnapGateway {
    client: Client,
    endpoint: String,
    server_key: String,
}

impl SnapGateway {
    pub fn new(
        endpoint: impl Into<String>,
        server_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            server_key: server_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(
            config.payment_gateway_url.clone(),
            config.payment_server_key.clone(),
            config.payment_timeout(),
        )
    }
}

#[async_trait]
impl PaymentGateway for SnapGateway {
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.id))]
    async fn process_payment(&self, transaction: &TransactionModel) -> Result<String, ServiceError> {
        let body = SnapRequest {
            transaction_details: TransactionDetails {
                order_id: &transaction.payment_code,
                gross_amount: format_amount(transaction.total_price),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.server_key, Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Payment gateway request failed");
                ServiceError::ExternalServiceError(format!("payment gateway unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, %detail, "Payment gateway rejected transaction");
            return Err(ServiceError::ExternalServiceError(format!(
                "payment gateway returned {}",
                status
            )));
        }

        let snap: SnapResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("malformed payment gateway response: {}", e))
        })?;

        info!(order_id = %transaction.payment_code, "Payment link issued");
        Ok(snap.redirect_url)
    }

    async fn hook_payment(
        &self,
        transaction_id: Uuid,
        notification: &PaymentNotification,
    ) -> Result<PaymentStatus, ServiceError> {
        let status = interpret_status(notification)?;
        info!(
            %transaction_id,
            reported = %notification.transaction_status,
            fraud_status = ?notification.fraud_status,
            %status,
            "Interpreted payment notification"
        );
        Ok(status)
    }
}
