use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Kitchen and waiter fulfillment stage of a transaction.
///
/// The happy path is totally ordered:
/// `pending -> preparing -> ready_to_serve -> delivering -> served`.
/// Cancellation is a payment concern and has no state here.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "preparing")]
    Preparing,
    #[sea_orm(string_value = "ready_to_serve")]
    ReadyToServe,
    #[sea_orm(string_value = "delivering")]
    Delivering,
    #[sea_orm(string_value = "served")]
    Served,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::ReadyToServe => "ready_to_serve",
            Self::Delivering => "delivering",
            Self::Served => "served",
        }
    }

    /// The only state reachable from this one, `None` once served.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::Pending => Some(Self::Preparing),
            Self::Preparing => Some(Self::ReadyToServe),
            Self::ReadyToServe => Some(Self::Delivering),
            Self::Delivering => Some(Self::Served),
            Self::Served => None,
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl FromStr for OrderStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "ready_to_serve" => Ok(Self::ReadyToServe),
            "delivering" => Ok(Self::Delivering),
            "served" => Ok(Self::Served),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

/// Staff-driven moves through the fulfillment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderTransition {
    StartCooking,
    FinishCooking,
    StartDelivering,
    FinishDelivering,
}

impl OrderTransition {
    /// State the transaction must be in for the transition to fire.
    pub fn precondition(&self) -> OrderStatus {
        match self {
            Self::StartCooking => OrderStatus::Pending,
            Self::FinishCooking => OrderStatus::Preparing,
            Self::StartDelivering => OrderStatus::ReadyToServe,
            Self::FinishDelivering => OrderStatus::Delivering,
        }
    }

    pub fn target(&self) -> OrderStatus {
        match self {
            Self::StartCooking => OrderStatus::Preparing,
            Self::FinishCooking => OrderStatus::ReadyToServe,
            Self::StartDelivering => OrderStatus::Delivering,
            Self::FinishDelivering => OrderStatus::Served,
        }
    }

    /// Checks the precondition without skipping or auto-correcting states.
    pub fn check(&self, current: OrderStatus) -> Result<(), ServiceError> {
        let expected = self.precondition();
        if current == expected {
            Ok(())
        } else {
            Err(ServiceError::InvalidOrderStatus { current, expected })
        }
    }
}
