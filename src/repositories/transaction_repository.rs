use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::transaction::{
    ActiveModel as TransactionActiveModel, Column, Entity as Transaction,
    Model as TransactionModel,
};
use crate::errors::AppError;
use crate::models::{OrderStatus, OrderTransition, PaymentStatus, Price, QueueCode};

/// Fields needed to open a new transaction row.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub table_id: Uuid,
    pub payment_code: String,
    pub total_price: Price,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionRepository;

impl TransactionRepository {
    /// Insert a pending, unpaid transaction without a queue code
    pub async fn create<C>(
        &self,
        conn: &C,
        new: NewTransaction,
    ) -> Result<TransactionModel, AppError>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        TransactionActiveModel {
            id: Set(new.id),
            user_id: Set(new.user_id),
            table_id: Set(new.table_id),
            payment_code: Set(new.payment_code),
            payment_status: Set(PaymentStatus::Pending),
            order_status: Set(OrderStatus::Pending),
            queue_code: Set(None),
            total_price: Set(new.total_price.amount()),
            cooking_started_at: Set(None),
            cooked_at: Set(None),
            served_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(AppError::DatabaseError)
    }

    pub async fn find_by_id<C>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<TransactionModel>, AppError>
    where
        C: ConnectionTrait,
    {
        Transaction::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Find the active transaction holding a queue code.
    ///
    /// Served transactions release their code, so a wrapped sequence can
    /// reissue it without the two colliding here. When more than one active
    /// row still carries the code the newest wins.
    pub async fn find_by_queue_code<C>(
        &self,
        conn: &C,
        code: &QueueCode,
    ) -> Result<Option<TransactionModel>, AppError>
    where
        C: ConnectionTrait,
    {
        Transaction::find()
            .filter(Column::QueueCode.eq(code.as_str()))
            .filter(Column::OrderStatus.ne(OrderStatus::Served))
            .filter(Column::DeletedAt.is_null())
            .order_by_desc(Column::CreatedAt)
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Find a transaction by the order id the payment gateway knows it by
    pub async fn find_by_payment_code<C>(
        &self,
        conn: &C,
        payment_code: &str,
    ) -> Result<Option<TransactionModel>, AppError>
    where
        C: ConnectionTrait,
    {
        Transaction::find()
            .filter(Column::PaymentCode.eq(payment_code))
            .filter(Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Raw queue code of the most recently created transaction that has one,
    /// ignoring `exclude`.
    pub async fn latest_queue_code<C>(
        &self,
        conn: &C,
        exclude: Uuid,
    ) -> Result<Option<String>, AppError>
    where
        C: ConnectionTrait,
    {
        let latest = Transaction::find()
            .filter(Column::QueueCode.is_not_null())
            .filter(Column::Id.ne(exclude))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::QueueCode)
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(latest.and_then(|model| model.queue_code))
    }

    pub async fn set_queue_code<C>(
        &self,
        conn: &C,
        id: Uuid,
        code: &QueueCode,
    ) -> Result<(), AppError>
    where
        C: ConnectionTrait,
    {
        let result = Transaction::update_many()
            .col_expr(Column::QueueCode, Expr::value(code.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(AppError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(AppError::TransactionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// One page of live transactions, newest first, plus the total row count.
    /// `page` is 1-based.
    pub async fn paginate<C>(
        &self,
        conn: &C,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<TransactionModel>, u64), AppError>
    where
        C: ConnectionTrait,
    {
        let paginator = Transaction::find()
            .filter(Column::DeletedAt.is_null())
            .order_by_desc(Column::CreatedAt)
            .paginate(conn, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(AppError::DatabaseError)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(AppError::DatabaseError)?;

        Ok((rows, total))
    }

    /// Live transactions in `status`, oldest first
    pub async fn find_by_status<C>(
        &self,
        conn: &C,
        status: OrderStatus,
    ) -> Result<Vec<TransactionModel>, AppError>
    where
        C: ConnectionTrait,
    {
        Transaction::find()
            .filter(Column::OrderStatus.eq(status))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::CreatedAt)
            .all(conn)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Oldest paid transaction that is still waiting for the kitchen
    pub async fn next_paid_pending<C>(
        &self,
        conn: &C,
    ) -> Result<Option<TransactionModel>, AppError>
    where
        C: ConnectionTrait,
    {
        Transaction::find()
            .filter(Column::OrderStatus.eq(OrderStatus::Pending))
            .filter(Column::PaymentStatus.is_in(PaymentStatus::paid_statuses()))
            .filter(Column::QueueCode.is_not_null())
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::CreatedAt)
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Compare-and-swap a workflow transition.
    ///
    /// Moves the row from the transition's precondition to its target and
    /// stamps the matching timestamp. Returns `false` when the row was not in
    /// the expected state, in which case nothing is written.
    pub async fn transition<C>(
        &self,
        conn: &C,
        id: Uuid,
        transition: OrderTransition,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>
    where
        C: ConnectionTrait,
    {
        let mut update = Transaction::update_many()
            .col_expr(Column::OrderStatus, Expr::value(transition.target()))
            .col_expr(Column::UpdatedAt, Expr::value(at));

        update = match transition {
            OrderTransition::StartCooking => {
                update.col_expr(Column::CookingStartedAt, Expr::value(Some(at)))
            }
            OrderTransition::FinishCooking => {
                update.col_expr(Column::CookedAt, Expr::value(Some(at)))
            }
            OrderTransition::StartDelivering => update,
            OrderTransition::FinishDelivering => {
                update.col_expr(Column::ServedAt, Expr::value(Some(at)))
            }
        };

        let result = update
            .filter(Column::Id.eq(id))
            .filter(Column::OrderStatus.eq(transition.precondition()))
            .exec(conn)
            .await
            .map_err(AppError::DatabaseError)?;

        match result.rows_affected {
            0 => {
                warn!(transaction_id = %id, %transition, "Transition lost compare-and-swap");
                Ok(false)
            }
            _ => {
                debug!(transaction_id = %id, %transition, "Transition applied");
                Ok(true)
            }
        }
    }

    pub async fn update_payment_status<C>(
        &self,
        conn: &C,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<(), AppError>
    where
        C: ConnectionTrait,
    {
        let result = Transaction::update_many()
            .col_expr(Column::PaymentStatus, Expr::value(status))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(AppError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(AppError::TransactionNotFound(id.to_string()));
        }
        Ok(())
    }
}
