#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

use dinein_api::{
    config::AppConfig,
    dto::{CreateTransactionRequest, TransactionResponse},
    entities::{menu, restaurant_table, transaction, user},
    errors::ServiceError,
    events::Event,
    models::PaymentStatus,
    payments::{interpret_status, notification_signature, PaymentGateway, PaymentNotification},
    services::pricing::LineItem,
    AppState,
};

pub const SERVER_KEY: &str = "SB-Mid-server-integration";

/// Gateway double that issues predictable links and can be told to fail.
#[derive(Default)]
pub struct StubGateway {
    fail: AtomicBool,
    payment_calls: AtomicUsize,
    hook_calls: AtomicUsize,
}

impl StubGateway {
    pub fn fail_payments(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn payment_calls(&self) -> usize {
        self.payment_calls.load(Ordering::SeqCst)
    }

    pub fn hook_calls(&self) -> usize {
        self.hook_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn process_payment(
        &self,
        transaction: &transaction::Model,
    ) -> Result<String, ServiceError> {
        self.payment_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::ExternalServiceError(
                "gateway unavailable".into(),
            ));
        }
        Ok(format!("https://pay.test/{}", transaction.payment_code))
    }

    async fn hook_payment(
        &self,
        _transaction_id: Uuid,
        notification: &PaymentNotification,
    ) -> Result<PaymentStatus, ServiceError> {
        self.hook_calls.fetch_add(1, Ordering::SeqCst);
        interpret_status(notification)
    }
}

/// Application state over a throwaway SQLite file.
pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<StubGateway>,
    pub events: mpsc::Receiver<Event>,
    pub user_id: Uuid,
    pub table_id: Uuid,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("dinein_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.payment_server_key = SERVER_KEY.to_string();
        cfg.default_page_size = 2;
        cfg.max_page_size = 10;

        let gateway = Arc::new(StubGateway::default());
        let (state, events) = AppState::build_with_gateway(cfg, gateway.clone())
            .await
            .expect("failed to build app state");

        let mut app = Self {
            state,
            gateway,
            events,
            user_id: Uuid::nil(),
            table_id: Uuid::nil(),
            _dir: dir,
        };
        app.user_id = app.seed_user("Sari").await;
        app.table_id = app.seed_table("T1").await;
        app
    }

    pub async fn seed_user(&self, name: &str) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        user::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            email: Set(format!("{}@example.com", id)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed user");
        id
    }

    pub async fn seed_table(&self, name: &str) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        restaurant_table::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            capacity: Set(4),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed table");
        id
    }

    pub async fn seed_menu(&self, name: &str, price: Decimal, cooking_duration: i32) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        menu::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            cooking_duration: Set(cooking_duration),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed menu");
        id
    }

    pub fn request(&self, items: &[(Uuid, i64)]) -> CreateTransactionRequest {
        CreateTransactionRequest {
            user_id: self.user_id,
            table_id: self.table_id,
            items: items
                .iter()
                .map(|&(menu_id, quantity)| LineItem { menu_id, quantity })
                .collect(),
        }
    }

    pub async fn create(&self, items: &[(Uuid, i64)]) -> TransactionResponse {
        self.state
            .transactions
            .create_transaction(self.request(items))
            .await
            .expect("failed to create transaction")
    }

    pub async fn stored(&self, id: Uuid) -> transaction::Model {
        transaction::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query failed")
            .expect("transaction missing")
    }

    pub async fn set_payment_status(&self, id: Uuid, status: PaymentStatus) {
        transaction::Entity::update_many()
            .col_expr(transaction::Column::PaymentStatus, Expr::value(status))
            .filter(transaction::Column::Id.eq(id))
            .exec(&*self.state.db)
            .await
            .expect("failed to update payment status");
    }

    pub async fn backdate(
        &self,
        id: Uuid,
        column: transaction::Column,
        at: DateTime<Utc>,
    ) {
        transaction::Entity::update_many()
            .col_expr(column, Expr::value(Some(at)))
            .filter(transaction::Column::Id.eq(id))
            .exec(&*self.state.db)
            .await
            .expect("failed to backdate transaction");
    }

    /// Collects every event published so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn signed_notification(
    order_id: &str,
    gross_amount: &str,
    transaction_status: &str,
    fraud_status: Option<&str>,
) -> PaymentNotification {
    PaymentNotification {
        order_id: order_id.to_string(),
        status_code: "200".to_string(),
        gross_amount: gross_amount.to_string(),
        signature_key: notification_signature(order_id, "200", gross_amount, SERVER_KEY),
        transaction_status: transaction_status.to_string(),
        fraud_status: fraud_status.map(str::to_string),
    }
}
