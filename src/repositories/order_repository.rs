use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::menu::{Entity as Menu, Model as MenuModel};
use crate::entities::order::{
    ActiveModel as OrderActiveModel, Column, Entity as Order, Model as OrderModel,
};
use crate::errors::AppError;

/// An order row joined with the menu it references.
pub type OrderWithMenu = (OrderModel, Option<MenuModel>);

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRepository;

impl OrderRepository {
    /// Create one line item
    pub async fn create<C>(
        &self,
        conn: &C,
        transaction_id: Uuid,
        menu_id: Uuid,
        quantity: i32,
    ) -> Result<OrderModel, AppError>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        OrderActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_id: Set(transaction_id),
            menu_id: Set(menu_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(AppError::DatabaseError)
    }

    /// Line items of a transaction in insertion order
    pub async fn find_by_transaction_id<C>(
        &self,
        conn: &C,
        transaction_id: Uuid,
    ) -> Result<Vec<OrderModel>, AppError>
    where
        C: ConnectionTrait,
    {
        Order::find()
            .filter(Column::TransactionId.eq(transaction_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::CreatedAt)
            .all(conn)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Line items of a transaction together with their menus
    pub async fn find_lines_by_transaction_id<C>(
        &self,
        conn: &C,
        transaction_id: Uuid,
    ) -> Result<Vec<OrderWithMenu>, AppError>
    where
        C: ConnectionTrait,
    {
        Order::find()
            .find_also_related(Menu)
            .filter(Column::TransactionId.eq(transaction_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::CreatedAt)
            .all(conn)
            .await
            .map_err(AppError::DatabaseError)
    }
}
