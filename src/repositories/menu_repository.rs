use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::menu::{Column, Entity as Menu, Model as MenuModel};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default)]
pub struct MenuRepository;

impl MenuRepository {
    /// Find a live (not soft-deleted) menu by ID
    pub async fn find_by_id<C>(&self, conn: &C, id: Uuid) -> Result<Option<MenuModel>, AppError>
    where
        C: ConnectionTrait,
    {
        Menu::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }
}
