mod common;

use std::collections::HashSet;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use common::{signed_notification, TestApp};
use dinein_api::{
    entities::{order, transaction},
    errors::ServiceError,
    events::Event,
    models::{OrderStatus, PaymentStatus, Price, QueueCode},
    pagination::PageRequest,
    repositories::{NewTransaction, TransactionRepository},
};

async fn row_counts(app: &TestApp) -> (u64, u64) {
    let transactions = transaction::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    let orders = order::Entity::find().count(&*app.state.db).await.unwrap();
    (transactions, orders)
}

#[tokio::test]
async fn creation_prices_items_and_issues_sequential_codes() {
    let mut app = TestApp::new().await;
    let rice = app.seed_menu("Nasi Goreng", dec!(12500.50), 15).await;
    let tea = app.seed_menu("Es Teh", dec!(5000), 2).await;

    let first = app.create(&[(rice, 2), (tea, 1)]).await;
    let second = app.create(&[(tea, 3)]).await;
    let third = app.create(&[(rice, 1)]).await;

    assert_eq!(first.queue_code, "Q0001");
    assert_eq!(second.queue_code, "Q0002");
    assert_eq!(third.queue_code, "Q0003");

    assert_eq!(first.total_price, "30001.00");
    assert_eq!(first.payment_link, format!("https://pay.test/{}", first.id));
    assert_eq!(first.orders.len(), 2);
    assert_eq!(first.orders[0].name, "Nasi Goreng");
    assert_eq!(first.orders[0].price, "12500.50");
    assert_eq!(first.orders[0].quantity, 2);

    let stored = app.stored(first.id).await;
    assert_eq!(stored.order_status, OrderStatus::Pending);
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.payment_code, first.id.to_string());
    assert_eq!(stored.total_price, dec!(30001.00));
    assert_eq!(stored.queue_code().map(|c| c.number()), Some(1));

    let events = app.drain_events();
    assert_eq!(events.len(), 3);
    assert_matches!(
        &events[0],
        Event::TransactionCreated { transaction_id, queue_code, .. }
            if *transaction_id == first.id && queue_code == "Q0001"
    );
}

#[tokio::test]
async fn full_workflow_walks_every_state_once() {
    let mut app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 1)]).await;
    let code = created.queue_code.clone();
    let svc = &app.state.transactions;

    let cooking = svc.start_cooking(&code).await.unwrap();
    assert_eq!(cooking.order_status, OrderStatus::Preparing);
    assert_eq!(cooking.queue_code, code);
    assert_eq!(cooking.orders[0].name, "Soto Ayam");

    let ready = svc.finish_cooking(&code).await.unwrap();
    assert_eq!(ready.order_status, OrderStatus::ReadyToServe);

    let delivering = svc.start_delivering(&code).await.unwrap();
    assert_eq!(delivering.order_status, OrderStatus::Delivering);

    let served = svc.finish_delivering(&code).await.unwrap();
    assert_eq!(served.order_status, OrderStatus::Served);

    let stored = app.stored(created.id).await;
    assert_eq!(stored.order_status, OrderStatus::Served);
    let started = stored.cooking_started_at.unwrap();
    let cooked = stored.cooked_at.unwrap();
    let served_at = stored.served_at.unwrap();
    assert!(started <= cooked && cooked <= served_at);
    assert!(started >= stored.created_at);

    // A served transaction no longer answers to its code.
    assert_matches!(
        svc.start_cooking(&code).await,
        Err(ServiceError::TransactionNotFound(_))
    );

    let transitions: Vec<(OrderStatus, OrderStatus)> = app
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            Event::OrderStatusChanged {
                old_status,
                new_status,
                ..
            } => Some((old_status, new_status)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (OrderStatus::Pending, OrderStatus::Preparing),
            (OrderStatus::Preparing, OrderStatus::ReadyToServe),
            (OrderStatus::ReadyToServe, OrderStatus::Delivering),
            (OrderStatus::Delivering, OrderStatus::Served),
        ]
    );
}

#[tokio::test]
async fn out_of_order_transition_writes_nothing() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 1)]).await;
    let before = app.stored(created.id).await;

    assert_matches!(
        app.state.transactions.finish_cooking(&created.queue_code).await,
        Err(ServiceError::InvalidOrderStatus {
            current: OrderStatus::Pending,
            expected: OrderStatus::Preparing,
        })
    );
    assert_matches!(
        app.state
            .transactions
            .start_delivering(&created.queue_code)
            .await,
        Err(ServiceError::InvalidOrderStatus { .. })
    );

    let after = app.stored(created.id).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn repeated_transition_is_rejected() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 1)]).await;

    app.state
        .transactions
        .start_cooking(&created.queue_code)
        .await
        .unwrap();
    let first_start = app.stored(created.id).await.cooking_started_at;

    assert_matches!(
        app.state.transactions.start_cooking(&created.queue_code).await,
        Err(ServiceError::InvalidOrderStatus {
            current: OrderStatus::Preparing,
            expected: OrderStatus::Pending,
        })
    );
    assert_eq!(app.stored(created.id).await.cooking_started_at, first_start);
}

#[tokio::test]
async fn unknown_or_malformed_codes_are_rejected() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 1)]).await;

    assert_matches!(
        app.state.transactions.start_cooking("Q0999").await,
        Err(ServiceError::TransactionNotFound(code)) if code == "Q0999"
    );
    assert_matches!(
        app.state.transactions.start_cooking("table-7").await,
        Err(ServiceError::InvalidInput(_))
    );
    assert_eq!(
        app.stored(created.id).await.order_status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn gateway_failure_rolls_back_everything() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;

    app.gateway.fail_payments(true);
    assert_matches!(
        app.state
            .transactions
            .create_transaction(app.request(&[(soup, 2)]))
            .await,
        Err(ServiceError::ExternalServiceError(_))
    );
    assert_eq!(app.gateway.payment_calls(), 1);
    assert_eq!(row_counts(&app).await, (0, 0));

    // The failed attempt did not consume a queue code.
    app.gateway.fail_payments(false);
    let created = app.create(&[(soup, 1)]).await;
    assert_eq!(created.queue_code, "Q0001");
}

#[tokio::test]
async fn missing_references_fail_without_writes() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let svc = &app.state.transactions;

    let mut request = app.request(&[(soup, 1)]);
    request.user_id = Uuid::new_v4();
    assert_matches!(
        svc.create_transaction(request).await,
        Err(ServiceError::UserNotFound(_))
    );

    let mut request = app.request(&[(soup, 1)]);
    request.table_id = Uuid::new_v4();
    assert_matches!(
        svc.create_transaction(request).await,
        Err(ServiceError::TableNotFound(_))
    );

    let ghost = Uuid::new_v4();
    assert_matches!(
        svc.create_transaction(app.request(&[(soup, 1), (ghost, 1)]))
            .await,
        Err(ServiceError::MenuNotFound(id)) if id == ghost
    );

    assert_matches!(
        svc.create_transaction(app.request(&[])).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        svc.create_transaction(app.request(&[(soup, -1)])).await,
        Err(ServiceError::InvalidQuantity(-1))
    );

    assert_eq!(app.gateway.payment_calls(), 0);
    assert_eq!(row_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn signed_notification_updates_payment_only() {
    let mut app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 2)]).await;
    let order_id = created.id.to_string();

    let status = app
        .state
        .transactions
        .hook_transaction(signed_notification(&order_id, "65000.00", "settlement", None))
        .await
        .unwrap();
    assert_eq!(status, PaymentStatus::Settlement);

    let stored = app.stored(created.id).await;
    assert_eq!(stored.payment_status, PaymentStatus::Settlement);
    assert_eq!(stored.order_status, OrderStatus::Pending);

    assert_matches!(
        app.drain_events().last(),
        Some(Event::PaymentStatusChanged {
            old_status: PaymentStatus::Pending,
            new_status: PaymentStatus::Settlement,
            ..
        })
    );
}

#[tokio::test]
async fn challenged_capture_stays_pending() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 1)]).await;

    let status = app
        .state
        .transactions
        .hook_transaction(signed_notification(
            &created.id.to_string(),
            "32500.00",
            "capture",
            Some("challenge"),
        ))
        .await
        .unwrap();

    assert_eq!(status, PaymentStatus::Pending);
    assert_eq!(
        app.stored(created.id).await.payment_status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn forged_or_unknown_notifications_change_nothing() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 1)]).await;

    let mut forged = signed_notification(&created.id.to_string(), "32500.00", "settlement", None);
    forged.gross_amount = "1.00".into();
    assert_matches!(
        app.state.transactions.hook_transaction(forged).await,
        Err(ServiceError::InvalidSignature)
    );
    assert_eq!(app.gateway.hook_calls(), 0);

    assert_matches!(
        app.state
            .transactions
            .hook_transaction(signed_notification("O-unknown", "1.00", "settlement", None))
            .await,
        Err(ServiceError::TransactionNotFound(id)) if id == "O-unknown"
    );

    assert_matches!(
        app.state
            .transactions
            .hook_transaction(signed_notification(
                &created.id.to_string(),
                "32500.00",
                "refund",
                None
            ))
            .await,
        Err(ServiceError::InvalidInput(_))
    );

    assert_eq!(
        app.stored(created.id).await.payment_status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn detail_flags_overdue_kitchen_work() {
    let app = TestApp::new().await;
    let soup = app.seed_menu("Soto Ayam", dec!(32500), 20).await;
    let created = app.create(&[(soup, 1)]).await;
    let svc = &app.state.transactions;

    let detail = svc.get_transaction_by_id(created.id).await.unwrap();
    assert!(!detail.is_delayed, "not cooking yet");

    svc.start_cooking(&created.queue_code).await.unwrap();
    assert!(!svc.get_transaction_by_id(created.id).await.unwrap().is_delayed);

    app.backdate(
        created.id,
        transaction::Column::CookingStartedAt,
        Utc::now() - Duration::minutes(30),
    )
    .await;
    let detail = svc.get_transaction_by_id(created.id).await.unwrap();
    assert!(detail.is_delayed);
    assert_eq!(detail.order_status, OrderStatus::Preparing);
    assert_eq!(detail.total_price, "32500.00");

    svc.finish_cooking(&created.queue_code).await.unwrap();
    svc.start_delivering(&created.queue_code).await.unwrap();
    svc.finish_delivering(&created.queue_code).await.unwrap();
    assert!(!svc.get_transaction_by_id(created.id).await.unwrap().is_delayed);
}

#[tokio::test]
async fn detail_of_unknown_transaction_is_not_found() {
    let app = TestApp::new().await;
    assert_matches!(
        app.state
            .transactions
            .get_transaction_by_id(Uuid::new_v4())
            .await,
        Err(ServiceError::TransactionNotFound(_))
    );
}

#[tokio::test]
async fn pagination_reports_pages_and_count() {
    let app = TestApp::new().await;
    let tea = app.seed_menu("Es Teh", dec!(5000), 2).await;
    for _ in 0..5 {
        app.create(&[(tea, 1)]).await;
    }
    let svc = &app.state.transactions;

    let first = svc
        .get_all_transactions_with_pagination(PageRequest::first(&app.state.config))
        .await
        .unwrap();
    assert_eq!(first.count, 5);
    assert_eq!(first.per_page, 2);
    assert_eq!(first.max_page, 3);
    assert_eq!(first.data.len(), 2);
    assert!(first.data[0].created_at >= first.data[1].created_at);

    let last = svc
        .get_all_transactions_with_pagination(PageRequest::new(3, 2))
        .await
        .unwrap();
    assert_eq!(last.data.len(), 1);

    let beyond = svc
        .get_all_transactions_with_pagination(PageRequest::new(4, 2))
        .await
        .unwrap();
    assert!(beyond.data.is_empty());

    assert_matches!(
        svc.get_all_transactions_with_pagination(PageRequest::new(1, 50))
            .await,
        Err(ServiceError::InvalidInput(_))
    );
    assert_matches!(
        svc.get_all_transactions_with_pagination(PageRequest::new(0, 2))
            .await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn kitchen_gets_oldest_paid_order_and_waiters_see_ready_ones() {
    let app = TestApp::new().await;
    let tea = app.seed_menu("Es Teh", dec!(5000), 2).await;
    let svc = &app.state.transactions;

    let unpaid = app.create(&[(tea, 1)]).await;
    let paid_first = app.create(&[(tea, 2)]).await;
    let paid_second = app.create(&[(tea, 3)]).await;

    assert_matches!(
        svc.get_next_order().await,
        Err(ServiceError::NotFound(_))
    );

    app.set_payment_status(paid_second.id, PaymentStatus::Capture)
        .await;
    app.set_payment_status(paid_first.id, PaymentStatus::Settlement)
        .await;

    let next = svc.get_next_order().await.unwrap();
    assert_eq!(next.id, paid_first.id);
    assert_eq!(next.orders[0].quantity, 2);

    svc.start_cooking(&paid_first.queue_code).await.unwrap();
    assert_eq!(svc.get_next_order().await.unwrap().id, paid_second.id);

    assert!(svc
        .get_all_ready_to_serve_transactions()
        .await
        .unwrap()
        .is_empty());
    svc.finish_cooking(&paid_first.queue_code).await.unwrap();
    let ready = svc.get_all_ready_to_serve_transactions().await.unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].id, paid_first.id);
    assert_eq!(ready[0].queue_code.as_deref(), Some(paid_first.queue_code.as_str()));

    assert_eq!(app.stored(unpaid.id).await.order_status, OrderStatus::Pending);
}

#[tokio::test]
async fn concurrent_creations_get_distinct_codes() {
    let app = TestApp::new().await;
    let tea = app.seed_menu("Es Teh", dec!(5000), 2).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = app.state.transactions.clone();
        let request = app.request(&[(tea, 1)]);
        handles.push(tokio::spawn(async move {
            svc.create_transaction(request).await
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let created = handle.await.unwrap().unwrap();
        codes.insert(created.queue_code);
    }

    let expected: HashSet<String> = (1..=8)
        .map(|n| QueueCode::from_number(n).to_string())
        .collect();
    assert_eq!(codes, expected);
}

#[tokio::test]
async fn sequence_wraps_after_the_last_code() {
    let app = TestApp::new().await;
    let tea = app.seed_menu("Es Teh", dec!(5000), 2).await;

    let repo = TransactionRepository;
    let id = Uuid::new_v4();
    repo.create(
        &*app.state.db,
        NewTransaction {
            id,
            user_id: app.user_id,
            table_id: app.table_id,
            payment_code: id.to_string(),
            total_price: Price::new(dec!(5000)).unwrap(),
        },
    )
    .await
    .unwrap();
    repo.set_queue_code(&*app.state.db, id, &QueueCode::parse("Q9999").unwrap())
        .await
        .unwrap();

    let created = app.create(&[(tea, 1)]).await;
    assert_eq!(created.queue_code, "Q0001");
}
