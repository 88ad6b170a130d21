mod support;

use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, MockDatabase};

use streamrich::error::AppError;
use streamrich::models::content_views;
use streamrich::models::enums::{Role, TransactionKind, TransactionStatus, WithdrawalStatus};
use streamrich::services::points_service::{PointsPolicy, PointsService, WithdrawalRequest};

use support::*;

fn policy() -> PointsPolicy {
    PointsPolicy {
        points_per_dollar: 100,
        min_withdrawal_points: 1000,
    }
}

fn request(points: i64) -> WithdrawalRequest {
    WithdrawalRequest {
        points,
        method: "PAYPAL".to_string(),
        destination: "payout@example.com".to_string(),
    }
}

#[tokio::test]
async fn test_withdrawal_below_threshold_is_refused() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let result = PointsService::request_withdrawal(&db, &policy(), CURRENCY, 2, request(999)).await;

    assert!(matches!(result, Err(AppError::BadRequest(ref msg)) if msg.contains("1000")));
    assert!(db.into_transaction_log().is_empty());
}

#[tokio::test]
async fn test_withdrawal_above_points_balance_is_refused() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user(2, Role::Streamer, Decimal::ZERO, 1200)]])
        .into_connection();

    let result =
        PointsService::request_withdrawal(&db, &policy(), CURRENCY, 2, request(1500)).await;

    assert!(matches!(
        result,
        Err(AppError::InsufficientPoints { available: 1200, required: 1500 })
    ));
}

#[tokio::test]
async fn test_withdrawal_debits_points_and_records_payout() {
    let ledger = transaction(
        41,
        2,
        TransactionKind::Payout,
        Decimal::new(1500, 2),
        TransactionStatus::Pending,
    );
    let created = withdrawal(1, 2, 1500, WithdrawalStatus::Pending);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user(2, Role::Streamer, Decimal::ZERO, 4000)]])
        .append_exec_results([exec(1)])
        .append_query_results([vec![ledger]])
        .append_query_results([vec![created.clone()]])
        .into_connection();

    let result = PointsService::request_withdrawal(&db, &policy(), CURRENCY, 2, request(1500))
        .await
        .unwrap();

    assert_eq!(result, created);
    assert_eq!(result.amount, Decimal::new(1500, 2));

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("PAYOUT"));
    assert_eq!(log.matches("INSERT INTO").count(), 2);
}

#[tokio::test]
async fn test_rejected_withdrawal_refunds_points() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![withdrawal(3, 2, 1000, WithdrawalStatus::Pending)]])
        .append_exec_results([exec(1), exec(1), exec(1)])
        .into_connection();

    let result = PointsService::review_withdrawal(&db, 3, false).await.unwrap();
    assert_eq!(result.status, WithdrawalStatus::Rejected);
    assert!(result.processed_at.is_some());

    let stmts = statements(db);
    assert!(has_status_guard(&stmts, "withdrawals"));
    assert!(has_status_guard(&stmts, "transactions"));

    let log = format!("{:?}", stmts);
    assert!(log.contains("REJECTED"));
    assert!(log.contains("FAILED"));
    assert!(stmts.iter().any(|stmt| stmt.sql.starts_with("UPDATE \"users\"")));
}

#[tokio::test]
async fn test_approved_withdrawal_keeps_points_debited() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![withdrawal(5, 2, 2000, WithdrawalStatus::Pending)]])
        .append_exec_results([exec(1), exec(1)])
        .into_connection();

    let result = PointsService::review_withdrawal(&db, 5, true).await.unwrap();
    assert_eq!(result.status, WithdrawalStatus::Completed);

    let stmts = statements(db);
    assert!(format!("{:?}", stmts).contains("COMPLETED"));
    assert!(!stmts.iter().any(|stmt| stmt.sql.starts_with("UPDATE \"users\"")));
}

#[tokio::test]
async fn test_concurrent_review_refunds_once() {
    // Lue PENDING, mais un autre ADMIN l'a traitée avant notre UPDATE
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![withdrawal(6, 2, 1000, WithdrawalStatus::Pending)]])
        .append_exec_results([exec(0)])
        .into_connection();

    let result = PointsService::review_withdrawal(&db, 6, false).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stmts = statements(db);
    assert!(has_status_guard(&stmts, "withdrawals"));
    assert!(!stmts.iter().any(|stmt| stmt.sql.starts_with("UPDATE \"users\"")));
    assert!(!stmts.iter().any(|stmt| stmt.sql.starts_with("UPDATE \"transactions\"")));
}

#[tokio::test]
async fn test_processed_withdrawal_cannot_be_reviewed_again() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![withdrawal(4, 2, 1000, WithdrawalStatus::Completed)]])
        .into_connection();

    let result = PointsService::review_withdrawal(&db, 4, true).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_first_view_awards_points() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![content_item(8, 1, 25)]])
        .append_query_results([Vec::<content_views::Model>::new()])
        .append_exec_results([exec(1)])
        .append_query_results([vec![view(1, 2, 8, 25)]])
        .append_exec_results([exec(1)])
        .into_connection();

    let outcome = PointsService::record_view(&db, 2, 8).await.unwrap();

    assert!(outcome.first_view);
    assert_eq!(outcome.points_awarded, 25);
    assert_eq!(outcome.views, 11);
}

#[tokio::test]
async fn test_repeat_view_awards_nothing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![content_item(8, 1, 25)]])
        .append_query_results([vec![view(1, 2, 8, 25)]])
        .append_exec_results([exec(1)])
        .into_connection();

    let outcome = PointsService::record_view(&db, 2, 8).await.unwrap();

    assert!(!outcome.first_view);
    assert_eq!(outcome.points_awarded, 0);

    let log = format!("{:?}", db.into_transaction_log());
    assert!(!log.contains("INSERT"));
}

#[tokio::test]
async fn test_creator_viewing_own_content_earns_nothing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![content_item(8, 2, 25)]])
        .append_query_results([Vec::<content_views::Model>::new()])
        .append_exec_results([exec(1)])
        .append_query_results([vec![view(1, 2, 8, 0)]])
        .into_connection();

    let outcome = PointsService::record_view(&db, 2, 8).await.unwrap();

    assert!(outcome.first_view);
    assert_eq!(outcome.points_awarded, 0);
}
