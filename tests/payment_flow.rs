mod support;

use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, MockDatabase};

use streamrich::error::AppError;
use streamrich::models::enums::{TransactionKind, TransactionStatus};
use streamrich::models::product_purchases;
use streamrich::services::payment_service::{OrderTarget, PaymentService};

use support::*;

#[tokio::test]
async fn test_declined_capture_marks_failed_without_purchase() {
    let price = Decimal::new(1500, 2);
    let pending = paypal_transaction(
        7,
        2,
        TransactionKind::Purchase,
        price,
        TransactionStatus::Pending,
        Some(5),
    );

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_exec_results([exec(1)])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Declined);

    let result = PaymentService::capture_order(&db, &gateway, 2, "ORDER-TX-7").await;

    assert!(matches!(result, Err(AppError::PaymentDeclined(ref s)) if s == "DECLINED"));

    let stmts = statements(db);
    assert!(has_status_guard(&stmts, "transactions"));
    assert!(format!("{:?}", stmts).contains("FAILED"));
    assert!(!stmts.iter().any(|stmt| stmt.sql.starts_with("INSERT")));
}

#[tokio::test]
async fn test_gateway_error_on_capture_marks_failed() {
    let pending = paypal_transaction(
        8,
        2,
        TransactionKind::Deposit,
        Decimal::new(2000, 2),
        TransactionStatus::Pending,
        None,
    );

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_exec_results([exec(1)])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Unavailable);

    let result = PaymentService::capture_order(&db, &gateway, 2, "ORDER-TX-8").await;

    assert!(matches!(result, Err(AppError::Gateway(_))));
    let stmts = statements(db);
    assert!(has_status_guard(&stmts, "transactions"));
    assert!(format!("{:?}", stmts).contains("FAILED"));
    assert!(!stmts.iter().any(|stmt| stmt.sql.starts_with("INSERT")));
}

#[tokio::test]
async fn test_gateway_error_does_not_overwrite_settled_order() {
    // Une autre capture a déjà passé la ligne à COMPLETED: l'UPDATE gardé ne touche rien
    let pending = paypal_transaction(
        14,
        2,
        TransactionKind::Deposit,
        Decimal::new(2000, 2),
        TransactionStatus::Pending,
        None,
    );

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_exec_results([exec(0)])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Unavailable);

    let result = PaymentService::capture_order(&db, &gateway, 2, "ORDER-TX-14").await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_concurrent_capture_credits_nothing() {
    let pending = paypal_transaction(
        15,
        2,
        TransactionKind::Deposit,
        Decimal::new(2000, 2),
        TransactionStatus::Pending,
        None,
    );

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_exec_results([exec(0)])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Completed);

    let result = PaymentService::capture_order(&db, &gateway, 2, "ORDER-TX-15").await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    let stmts = statements(db);
    assert!(has_status_guard(&stmts, "transactions"));
    assert!(!stmts.iter().any(|stmt| stmt.sql.starts_with("UPDATE \"users\"")));
}

#[tokio::test]
async fn test_capture_of_failed_order_is_refused() {
    let failed = paypal_transaction(
        9,
        2,
        TransactionKind::Deposit,
        Decimal::ONE,
        TransactionStatus::Failed,
        None,
    );

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![failed]])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Completed);

    let result = PaymentService::capture_order(&db, &gateway, 2, "ORDER-TX-9").await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_completed_deposit_credits_balance() {
    let amount = Decimal::new(2500, 2);
    let pending = paypal_transaction(
        10,
        2,
        TransactionKind::Deposit,
        amount,
        TransactionStatus::Pending,
        None,
    );

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_exec_results([exec(1), exec(1)])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Completed);

    let captured = PaymentService::capture_order(&db, &gateway, 2, "ORDER-TX-10").await.unwrap();

    assert_eq!(captured.transaction.id, 10);
    assert_eq!(captured.transaction.status, TransactionStatus::Completed);
    assert!(captured.purchase.is_none());

    let stmts = statements(db);
    assert!(has_status_guard(&stmts, "transactions"));
    assert!(format!("{:?}", stmts).contains("COMPLETED"));
    assert!(stmts.iter().any(|stmt| stmt.sql.starts_with("UPDATE \"users\"")));
}

#[tokio::test]
async fn test_completed_product_order_creates_purchase() {
    let price = Decimal::new(1500, 2);
    let pending = paypal_transaction(
        11,
        2,
        TransactionKind::Purchase,
        price,
        TransactionStatus::Pending,
        Some(5),
    );
    let bought = purchase(3, 2, 5, 11, price);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_exec_results([exec(1)])
        .append_query_results([Vec::<product_purchases::Model>::new()])
        .append_query_results([vec![product(5, 1, price)]])
        .append_query_results([vec![bought.clone()]])
        .append_exec_results([exec(1)])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Completed);

    let captured = PaymentService::capture_order(&db, &gateway, 2, "ORDER-TX-11").await.unwrap();

    assert_eq!(captured.purchase, Some(bought));
    assert_eq!(captured.transaction.status, TransactionStatus::Completed);
}

#[tokio::test]
async fn test_create_order_gateway_failure_marks_failed() {
    let amount = Decimal::new(5000, 2);
    let pending = transaction(12, 2, TransactionKind::Deposit, amount, TransactionStatus::Pending);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_exec_results([exec(1)])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Unavailable);

    let result = PaymentService::create_order(
        &db,
        &gateway,
        2,
        CURRENCY,
        OrderTarget::Deposit(amount),
    )
    .await;

    assert!(matches!(result, Err(AppError::Gateway(_))));
    let stmts = statements(db);
    assert!(has_status_guard(&stmts, "transactions"));
    let log = format!("{:?}", stmts);
    assert!(log.contains("PENDING"));
    assert!(log.contains("FAILED"));
}

#[tokio::test]
async fn test_create_deposit_order() {
    let amount = Decimal::new(5000, 2);
    let pending = transaction(13, 2, TransactionKind::Deposit, amount, TransactionStatus::Pending);
    let mut with_order = pending.clone();
    with_order.payment_id = Some("ORDER-TX-13".to_string());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending]])
        .append_query_results([vec![with_order]])
        .into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Completed);

    let order = PaymentService::create_order(
        &db,
        &gateway,
        2,
        CURRENCY,
        OrderTarget::Deposit(amount),
    )
    .await
    .unwrap();

    assert_eq!(order.transaction_id, 13);
    assert_eq!(order.order_id, "ORDER-TX-13");
    assert_eq!(order.amount, amount);
    assert!(order.approve_url.is_some());
}

#[tokio::test]
async fn test_deposit_above_cap_is_refused_before_any_write() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let gateway = FakeGateway::new(FakeOutcome::Completed);

    let result = PaymentService::create_order(
        &db,
        &gateway,
        2,
        CURRENCY,
        OrderTarget::Deposit(Decimal::new(20_000, 0)),
    )
    .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(db.into_transaction_log().is_empty());
}
