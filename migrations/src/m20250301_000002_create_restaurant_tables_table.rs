use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RestaurantTables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RestaurantTables::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RestaurantTables::Name).string().not_null())
                    .col(
                        ColumnDef::new(RestaurantTables::Capacity)
                            .integer()
                            .not_null()
                            .default(4),
                    )
                    .col(
                        ColumnDef::new(RestaurantTables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RestaurantTables::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RestaurantTables::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RestaurantTables::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RestaurantTables {
    Table,
    Id,
    Name,
    Capacity,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
