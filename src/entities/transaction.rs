use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{OrderStatus, PaymentStatus, QueueCode};

/// Aggregate root of one dine-in order session: its payment and its
/// fulfillment progress.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub table_id: Uuid,

    /// Order id handed to the payment gateway.
    pub payment_code: String,
    pub payment_status: PaymentStatus,

    pub order_status: OrderStatus,

    /// `None` until issuance; see [`Model::queue_code`].
    pub queue_code: Option<String>,

    /// Computed at creation, never updated.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub total_price: Decimal,

    pub cooking_started_at: Option<DateTime<Utc>>,
    pub cooked_at: Option<DateTime<Utc>>,
    pub served_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    /// The issued queue code, or `None` when unset or unparseable.
    pub fn queue_code(&self) -> Option<QueueCode> {
        self.queue_code
            .as_deref()
            .and_then(|raw| QueueCode::parse(raw).ok())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::restaurant_table::Entity",
        from = "Column::TableId",
        to = "super::restaurant_table::Column::Id"
    )]
    RestaurantTable,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::restaurant_table::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RestaurantTable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
