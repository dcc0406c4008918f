use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Staff resolve transactions by the printed queue code
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_queue_code")
                    .table(Transactions::Table)
                    .col(Transactions::QueueCode)
                    .to_owned(),
            )
            .await?;

        // Webhook reconciliation looks up by the gateway order id
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_payment_code")
                    .table(Transactions::Table)
                    .col(Transactions::PaymentCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Kitchen and waiter boards filter by status, oldest first
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_status_created")
                    .table(Transactions::Table)
                    .col(Transactions::OrderStatus)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_transaction_id")
                    .table(Orders::Table)
                    .col(Orders::TransactionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_transaction_id")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_transactions_status_created")
                    .table(Transactions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_transactions_payment_code")
                    .table(Transactions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_transactions_queue_code")
                    .table(Transactions::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    QueueCode,
    PaymentCode,
    OrderStatus,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    TransactionId,
}
