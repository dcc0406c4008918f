use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Settlement state reported by the payment gateway.
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
pub enum PaymentStatus {
    #[sea_orm(string_value = "capture")]
    Capture,
    #[sea_orm(string_value = "settlement")]
    Settlement,
    #[sea_orm(string_value = "cancel")]
    Cancel,
    #[sea_orm(string_value = "deny")]
    Deny,
    #[sea_orm(string_value = "expire")]
    Expire,
    #[sea_orm(string_value = "pending")]
    Pending,
}

impl PaymentStatus {
    /// Money has been captured or settled.
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Capture | Self::Settlement)
    }

    pub fn paid_statuses() -> [PaymentStatus; 2] {
        [Self::Capture, Self::Settlement]
    }
}

impl FromStr for PaymentStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capture" => Ok(Self::Capture),
            "settlement" => Ok(Self::Settlement),
            "cancel" => Ok(Self::Cancel),
            "deny" => Ok(Self::Deny),
            "expire" => Ok(Self::Expire),
            "pending" => Ok(Self::Pending),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }
}
