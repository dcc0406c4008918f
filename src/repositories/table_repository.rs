use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::restaurant_table::{Column, Entity as RestaurantTable, Model as TableModel};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default)]
pub struct TableRepository;

impl TableRepository {
    /// Find a live (not soft-deleted) table by ID
    pub async fn find_by_id<C>(&self, conn: &C, id: Uuid) -> Result<Option<TableModel>, AppError>
    where
        C: ConnectionTrait,
    {
        RestaurantTable::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }
}
