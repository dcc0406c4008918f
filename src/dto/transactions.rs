use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::transaction::Model as TransactionModel;
use crate::errors::ServiceError;
use crate::models::{OrderStatus, PaymentStatus};
use crate::repositories::OrderWithMenu;
use crate::services::pricing::LineItem;

/// Request to open a transaction for a table.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub user_id: Uuid,
    pub table_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItem>,
}

/// One line of an order as shown to customers and staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub price: String,
    pub quantity: i32,
}

impl OrderLine {
    /// Builds the projection of a stored line. A line whose menu is gone
    /// breaks the transaction's shape.
    pub fn from_stored((order, menu): OrderWithMenu) -> Result<Self, ServiceError> {
        let menu = menu.ok_or_else(|| {
            ServiceError::InvalidTransaction(format!(
                "order {} references missing menu {}",
                order.id, order.menu_id
            ))
        })?;
        Ok(Self {
            name: menu.name,
            price: format_amount(menu.price),
            quantity: order.quantity,
        })
    }

    pub fn from_stored_all(lines: Vec<OrderWithMenu>) -> Result<Vec<Self>, ServiceError> {
        lines.into_iter().map(Self::from_stored).collect()
    }
}

/// Result of creating a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub queue_code: String,
    pub total_price: String,
    pub payment_link: String,
    pub orders: Vec<OrderLine>,
}

/// Result of a staff workflow transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub queue_code: String,
    pub order_status: OrderStatus,
    pub orders: Vec<OrderLine>,
}

/// Full view of one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub table_id: Uuid,
    pub queue_code: Option<String>,
    pub payment_code: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub total_price: String,
    pub cooking_started_at: Option<DateTime<Utc>>,
    pub cooked_at: Option<DateTime<Utc>>,
    pub served_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_delayed: bool,
    pub orders: Vec<OrderLine>,
}

impl TransactionDetail {
    pub fn new(model: TransactionModel, orders: Vec<OrderLine>, is_delayed: bool) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            table_id: model.table_id,
            queue_code: model.queue_code().map(|code| code.to_string()),
            payment_code: model.payment_code,
            payment_status: model.payment_status,
            order_status: model.order_status,
            total_price: format_amount(model.total_price),
            cooking_started_at: model.cooking_started_at,
            cooked_at: model.cooked_at,
            served_at: model.served_at,
            created_at: model.created_at,
            is_delayed,
            orders,
        }
    }
}

/// Row of a transaction listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub id: Uuid,
    pub queue_code: Option<String>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub total_price: String,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionModel> for TransactionSummary {
    fn from(model: TransactionModel) -> Self {
        Self {
            id: model.id,
            queue_code: model.queue_code().map(|code| code.to_string()),
            payment_status: model.payment_status,
            order_status: model.order_status,
            total_price: format_amount(model.total_price),
            created_at: model.created_at,
        }
    }
}

/// Money as a fixed two-decimal string.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
