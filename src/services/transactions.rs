use chrono::Utc;
use metrics::{counter, histogram};
use sea_orm::ConnectionTrait;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    db::{DbPool, UnitOfWork},
    dto::{
        format_amount, CreateTransactionRequest, OrderLine, TransactionDetail, TransactionResponse,
        TransactionSummary, TransitionResponse,
    },
    entities::transaction::Model as TransactionModel,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{delay, OrderStatus, OrderTransition, PaymentStatus, QueueCode},
    pagination::{PageRequest, Paginated},
    payments::{verify_notification, PaymentGateway, PaymentNotification},
    repositories::{NewTransaction, Repositories},
    services::{
        pricing::{calculate_total_price, RepositoryMenuLookup},
        queue::{generate_queue_code, QUEUE_ISSUANCE_LOCK_KEY},
    },
};

/// Serializes queue code issuance within this process. Held for the whole
/// creation unit of work so the code read and the code write commit together.
/// That unit includes the payment gateway call, so concurrent creations queue
/// behind gateway latency.
fn issuance_guard() -> &'static Mutex<()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(()))
}

/// Everything a successful creation produced before commit.
struct Created {
    transaction: TransactionModel,
    queue_code: QueueCode,
    orders: Vec<OrderLine>,
    payment_link: String,
}

/// Orchestrates the transaction lifecycle: creation, staff workflow
/// transitions, payment reconciliation and the read projections.
#[derive(Clone)]
pub struct TransactionService {
    db: Arc<DbPool>,
    repos: Repositories,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Option<EventSender>,
    server_key: String,
    max_page_size: u64,
}

impl TransactionService {
    pub fn new(db: Arc<DbPool>, gateway: Arc<dyn PaymentGateway>, config: &AppConfig) -> Self {
        Self {
            db,
            repos: Repositories::default(),
            gateway,
            event_sender: None,
            server_key: config.payment_server_key.clone(),
            max_page_size: config.max_page_size,
        }
    }

    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.publish(event).await;
        }
    }

    /// Opens a transaction: prices the items, issues a queue code, stores the
    /// order lines and obtains a payment link. Nothing is persisted unless
    /// every step, the gateway call included, succeeds.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, table_id = %request.table_id, items = request.items.len()))]
    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<TransactionResponse, ServiceError> {
        request.validate()?;
        if let Some(item) = request.items.iter().find(|item| item.quantity <= 0) {
            return Err(ServiceError::InvalidQuantity(item.quantity));
        }

        let started = Instant::now();
        // Released only after commit; the gateway round trip happens under it.
        let issuance = issuance_guard().lock().await;
        let uow = UnitOfWork::begin(&self.db).await?;

        let created = match self.create_in(&uow, &request).await {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, "Transaction creation failed");
                counter!("dinein_transactions.create_failed", 1);
                uow.rollback().await;
                return Err(e);
            }
        };
        uow.commit().await?;
        drop(issuance);

        histogram!(
            "dinein_transactions.create_duration",
            started.elapsed().as_secs_f64()
        );
        counter!("dinein_transactions.created", 1);

        let Created {
            transaction,
            queue_code,
            orders,
            payment_link,
        } = created;
        let total_price = format_amount(transaction.total_price);

        info!(transaction_id = %transaction.id, %queue_code, %total_price, "Transaction created");

        self.publish(Event::TransactionCreated {
            transaction_id: transaction.id,
            queue_code: queue_code.to_string(),
            total_price: total_price.clone(),
            occurred_at: Utc::now(),
        })
        .await;

        Ok(TransactionResponse {
            id: transaction.id,
            queue_code: queue_code.to_string(),
            total_price,
            payment_link,
            orders,
        })
    }

    async fn create_in(
        &self,
        uow: &UnitOfWork,
        request: &CreateTransactionRequest,
    ) -> Result<Created, ServiceError> {
        let conn = uow.conn();
        uow.advisory_lock(QUEUE_ISSUANCE_LOCK_KEY).await?;

        let user = self
            .repos
            .users
            .find_by_id(conn, request.user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(request.user_id))?;
        let table = self
            .repos
            .tables
            .find_by_id(conn, request.table_id)
            .await?
            .ok_or(ServiceError::TableNotFound(request.table_id))?;

        let lookup = RepositoryMenuLookup::new(self.repos.menus, conn);
        let total_price = calculate_total_price(&lookup, &request.items).await?;

        let id = Uuid::new_v4();
        let mut transaction = self
            .repos
            .transactions
            .create(
                conn,
                NewTransaction {
                    id,
                    user_id: user.id,
                    table_id: table.id,
                    payment_code: id.to_string(),
                    total_price,
                },
            )
            .await?;

        let queue_code = generate_queue_code(&self.repos.transactions, conn, id).await?;
        self.repos
            .transactions
            .set_queue_code(conn, id, &queue_code)
            .await?;
        transaction.queue_code = Some(queue_code.to_string());

        let mut orders = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let quantity =
                i32::try_from(item.quantity).map_err(|_| ServiceError::InvalidQuantity(item.quantity))?;
            let menu = self
                .repos
                .menus
                .find_by_id(conn, item.menu_id)
                .await?
                .ok_or(ServiceError::MenuNotFound(item.menu_id))?;
            self.repos.orders.create(conn, id, menu.id, quantity).await?;
            orders.push(OrderLine {
                name: menu.name,
                price: format_amount(menu.price),
                quantity,
            });
        }

        let payment_link = self.gateway.process_payment(&transaction).await?;

        Ok(Created {
            transaction,
            queue_code,
            orders,
            payment_link,
        })
    }

    /// pending -> preparing
    pub async fn start_cooking(&self, queue_code: &str) -> Result<TransitionResponse, ServiceError> {
        self.apply_transition(queue_code, OrderTransition::StartCooking)
            .await
    }

    /// preparing -> ready_to_serve
    pub async fn finish_cooking(&self, queue_code: &str) -> Result<TransitionResponse, ServiceError> {
        self.apply_transition(queue_code, OrderTransition::FinishCooking)
            .await
    }

    /// ready_to_serve -> delivering
    pub async fn start_delivering(
        &self,
        queue_code: &str,
    ) -> Result<TransitionResponse, ServiceError> {
        self.apply_transition(queue_code, OrderTransition::StartDelivering)
            .await
    }

    /// delivering -> served
    pub async fn finish_delivering(
        &self,
        queue_code: &str,
    ) -> Result<TransitionResponse, ServiceError> {
        self.apply_transition(queue_code, OrderTransition::FinishDelivering)
            .await
    }

    #[instrument(skip(self, transition), fields(transition = %transition))]
    async fn apply_transition(
        &self,
        queue_code: &str,
        transition: OrderTransition,
    ) -> Result<TransitionResponse, ServiceError> {
        let code = QueueCode::parse(queue_code)?;
        let uow = UnitOfWork::begin(&self.db).await?;

        let (transaction_id, response) = match self.transition_in(&uow, &code, transition).await {
            Ok(applied) => applied,
            Err(e) => {
                warn!(queue_code = %code, error = %e, "Transition rejected");
                uow.rollback().await;
                return Err(e);
            }
        };
        uow.commit().await?;

        counter!("dinein_transactions.transitions", 1, "transition" => transition.to_string());
        info!(%transaction_id, queue_code = %code, to = %transition.target(), "Order status changed");

        self.publish(Event::OrderStatusChanged {
            transaction_id,
            queue_code: code.to_string(),
            old_status: transition.precondition(),
            new_status: transition.target(),
            occurred_at: Utc::now(),
        })
        .await;

        Ok(response)
    }

    async fn transition_in(
        &self,
        uow: &UnitOfWork,
        code: &QueueCode,
        transition: OrderTransition,
    ) -> Result<(Uuid, TransitionResponse), ServiceError> {
        let conn = uow.conn();
        let transaction = self
            .repos
            .transactions
            .find_by_queue_code(conn, code)
            .await?
            .ok_or_else(|| ServiceError::TransactionNotFound(code.to_string()))?;

        transition.check(transaction.order_status)?;

        let applied = self
            .repos
            .transactions
            .transition(conn, transaction.id, transition, Utc::now())
            .await?;
        if !applied {
            let current = self
                .repos
                .transactions
                .find_by_id(conn, transaction.id)
                .await?
                .map(|latest| latest.order_status)
                .unwrap_or(transaction.order_status);
            return Err(ServiceError::InvalidOrderStatus {
                current,
                expected: transition.precondition(),
            });
        }

        let lines = self
            .repos
            .orders
            .find_lines_by_transaction_id(conn, transaction.id)
            .await?;

        Ok((
            transaction.id,
            TransitionResponse {
                queue_code: code.to_string(),
                order_status: transition.target(),
                orders: OrderLine::from_stored_all(lines)?,
            },
        ))
    }

    /// Full view of a transaction including whether the kitchen is running late.
    #[instrument(skip(self))]
    pub async fn get_transaction_by_id(&self, id: Uuid) -> Result<TransactionDetail, ServiceError> {
        let db = &*self.db;
        let transaction = self
            .repos
            .transactions
            .find_by_id(db, id)
            .await?
            .ok_or_else(|| ServiceError::TransactionNotFound(id.to_string()))?;
        self.detail(db, transaction).await
    }

    async fn detail<C>(
        &self,
        conn: &C,
        transaction: TransactionModel,
    ) -> Result<TransactionDetail, ServiceError>
    where
        C: ConnectionTrait,
    {
        let lines = self
            .repos
            .orders
            .find_lines_by_transaction_id(conn, transaction.id)
            .await?;

        let expected = delay::expected_cooking_time(
            lines
                .iter()
                .filter_map(|(_, menu)| menu.as_ref().map(|menu| menu.cooking_duration)),
        );
        let is_delayed = delay::is_delayed(
            transaction.cooking_started_at,
            transaction.served_at,
            expected,
            Utc::now(),
        );

        let orders = OrderLine::from_stored_all(lines)?;
        Ok(TransactionDetail::new(transaction, orders, is_delayed))
    }

    /// Newest transactions first.
    #[instrument(skip(self))]
    pub async fn get_all_transactions_with_pagination(
        &self,
        request: PageRequest,
    ) -> Result<Paginated<TransactionSummary>, ServiceError> {
        let request = request.checked(self.max_page_size)?;
        let (rows, count) = self
            .repos
            .transactions
            .paginate(&*self.db, request.page, request.per_page)
            .await?;

        Ok(Paginated::new(rows, request, count).map(TransactionSummary::from))
    }

    /// Transactions waiting for a waiter, oldest first.
    #[instrument(skip(self))]
    pub async fn get_all_ready_to_serve_transactions(
        &self,
    ) -> Result<Vec<TransactionSummary>, ServiceError> {
        let rows = self
            .repos
            .transactions
            .find_by_status(&*self.db, OrderStatus::ReadyToServe)
            .await?;
        Ok(rows.into_iter().map(TransactionSummary::from).collect())
    }

    /// The paid transaction the kitchen should cook next.
    #[instrument(skip(self))]
    pub async fn get_next_order(&self) -> Result<TransactionDetail, ServiceError> {
        let db = &*self.db;
        let transaction = self
            .repos
            .transactions
            .next_paid_pending(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("no paid order is waiting".into()))?;
        self.detail(db, transaction).await
    }

    /// Reconciles a gateway notification with the stored payment status.
    ///
    /// Only the payment status changes; the fulfillment workflow is driven by
    /// staff alone.
    #[instrument(skip(self, notification), fields(order_id = %notification.order_id, reported = %notification.transaction_status))]
    pub async fn hook_transaction(
        &self,
        notification: PaymentNotification,
    ) -> Result<PaymentStatus, ServiceError> {
        if self.server_key.is_empty() {
            warn!("No payment server key configured; rejecting notification");
            counter!("dinein_payments.signature_rejected", 1);
            return Err(ServiceError::InvalidSignature);
        }
        if !verify_notification(&notification, &self.server_key) {
            warn!("Payment notification signature mismatch");
            counter!("dinein_payments.signature_rejected", 1);
            return Err(ServiceError::InvalidSignature);
        }

        let uow = UnitOfWork::begin(&self.db).await?;
        let (transaction, status) = match self.hook_in(&uow, &notification).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(error = %e, "Payment notification not applied");
                uow.rollback().await;
                return Err(e);
            }
        };
        uow.commit().await?;

        info!(
            transaction_id = %transaction.id,
            old_status = %transaction.payment_status,
            new_status = %status,
            "Payment status reconciled"
        );
        if transaction.payment_status != status {
            self.publish(Event::PaymentStatusChanged {
                transaction_id: transaction.id,
                old_status: transaction.payment_status,
                new_status: status,
                occurred_at: Utc::now(),
            })
            .await;
        }

        Ok(status)
    }

    async fn hook_in(
        &self,
        uow: &UnitOfWork,
        notification: &PaymentNotification,
    ) -> Result<(TransactionModel, PaymentStatus), ServiceError> {
        let conn = uow.conn();
        let transaction = self
            .repos
            .transactions
            .find_by_payment_code(conn, &notification.order_id)
            .await?
            .ok_or_else(|| ServiceError::TransactionNotFound(notification.order_id.clone()))?;

        let status = self
            .gateway
            .hook_payment(transaction.id, notification)
            .await?;
        self.repos
            .transactions
            .update_payment_status(conn, transaction.id, status)
            .await?;

        Ok((transaction, status))
    }
}
