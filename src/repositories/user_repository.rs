use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::user::{Column, Entity as User, Model as UserModel};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default)]
pub struct UserRepository;

impl UserRepository {
    /// Find a live (not soft-deleted) user by ID
    pub async fn find_by_id<C>(&self, conn: &C, id: Uuid) -> Result<Option<UserModel>, AppError>
    where
        C: ConnectionTrait,
    {
        User::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }
}
