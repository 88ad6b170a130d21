// Outils partagés par les tests d'intégration
#![allow(dead_code)]

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, MockExecResult, Statement};

use streamrich::config::{AppConfig, PayPalConfig};
use streamrich::models::enums::{
    PurchaseStatus, Role, TransactionKind, TransactionStatus, WithdrawalStatus,
};
use streamrich::models::{
    content, content_views, plans, product_purchases, products, transactions, users, withdrawals,
};
use streamrich::services::paypal::{GatewayCapture, GatewayError, GatewayOrder, PaymentGateway};
use streamrich::utils::jwt;

pub const SECRET: &str = "integration-secret";
pub const CURRENCY: &str = "USD";

pub fn config(upload_dir: &Path, max_upload_bytes: usize) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes,
        paypal: PayPalConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            api_base: "http://paypal.invalid".to_string(),
        },
        currency: CURRENCY.to_string(),
        points_per_dollar: 100,
        min_withdrawal_points: 1000,
        auto_migrate: false,
        cookie_secure: false,
    }
}

pub fn token(user_id: i32, role: Role) -> String {
    jwt::generate_token(SECRET, user_id, &format!("user{}@example.com", user_id), role).unwrap()
}

pub fn bearer(user_id: i32, role: Role) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token(user_id, role)))
}

pub fn exec(rows: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: rows,
    }
}

/// Requêtes exécutées par la connexion mock, dans l'ordre
pub fn statements(db: DatabaseConnection) -> Vec<Statement> {
    db.into_transaction_log()
        .iter()
        .flat_map(|t| t.statements().to_vec())
        .collect()
}

/// UPDATE sur `table` conditionné par le statut courant de la ligne
pub fn has_status_guard(stmts: &[Statement], table: &str) -> bool {
    let update = format!("UPDATE \"{}\"", table);
    let guard = format!("\"{}\".\"status\" = ", table);
    stmts
        .iter()
        .any(|stmt| stmt.sql.starts_with(&update) && stmt.sql.contains(&guard))
}

/// Réponse simulée de PayPal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeOutcome {
    Completed,
    Declined,
    Unavailable,
}

pub struct FakeGateway {
    pub outcome: FakeOutcome,
}

impl FakeGateway {
    pub fn new(outcome: FakeOutcome) -> Self {
        Self { outcome }
    }

    fn unavailable() -> GatewayError {
        GatewayError::Api {
            status: 503,
            body: "service unavailable".to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        _amount: Decimal,
        _currency: &str,
        reference: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if self.outcome == FakeOutcome::Unavailable {
            return Err(Self::unavailable());
        }
        Ok(GatewayOrder {
            order_id: format!("ORDER-{}", reference),
            status: "CREATED".to_string(),
            approve_url: Some("https://paypal.test/approve".to_string()),
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<GatewayCapture, GatewayError> {
        let status = match self.outcome {
            FakeOutcome::Completed => "COMPLETED",
            FakeOutcome::Declined => "DECLINED",
            FakeOutcome::Unavailable => return Err(Self::unavailable()),
        };
        Ok(GatewayCapture {
            order_id: order_id.to_string(),
            status: status.to_string(),
        })
    }
}

// --- Lignes de test ---------------------------------------------------------

pub fn user(id: i32, role: Role, balance: Decimal, points: i64) -> users::Model {
    users::Model {
        id,
        email: format!("user{}@example.com", id),
        name: None,
        password_hash: None,
        role,
        balance,
        points,
        created_at: Utc::now(),
    }
}

pub fn product(id: i32, creator_id: i32, price: Decimal) -> products::Model {
    products::Model {
        id,
        creator_id,
        title: format!("Product {}", id),
        description: None,
        price,
        file_path: format!("/tmp/products/{}.zip", id),
        file_name: "pack.zip".to_string(),
        mime_type: "application/zip".to_string(),
        file_size: 2048,
        purchase_count: 0,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn transaction(
    id: i32,
    user_id: i32,
    kind: TransactionKind,
    amount: Decimal,
    status: TransactionStatus,
) -> transactions::Model {
    transactions::Model {
        id,
        user_id,
        kind,
        amount,
        currency: CURRENCY.to_string(),
        status,
        provider: None,
        payment_id: None,
        product_id: None,
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn paypal_transaction(
    id: i32,
    user_id: i32,
    kind: TransactionKind,
    amount: Decimal,
    status: TransactionStatus,
    product_id: Option<i32>,
) -> transactions::Model {
    transactions::Model {
        provider: Some("PAYPAL".to_string()),
        payment_id: Some(format!("ORDER-TX-{}", id)),
        product_id,
        ..transaction(id, user_id, kind, amount, status)
    }
}

pub fn purchase(
    id: i32,
    user_id: i32,
    product_id: i32,
    transaction_id: i32,
    amount: Decimal,
) -> product_purchases::Model {
    product_purchases::Model {
        id,
        user_id,
        product_id,
        transaction_id,
        amount,
        status: PurchaseStatus::Completed,
        created_at: Utc::now(),
    }
}

pub fn content_item(id: i32, creator_id: i32, points_reward: i64) -> content::Model {
    content::Model {
        id,
        creator_id,
        title: format!("Content {}", id),
        description: None,
        content_type: "video/mp4".to_string(),
        file_path: format!("/tmp/content/{}.mp4", id),
        file_size: 4096,
        points_reward,
        views: 10,
        plan_id: None,
        priority: 0,
        promoted_until: None,
        created_at: Utc::now(),
    }
}

pub fn plan(
    id: i32,
    price: Decimal,
    duration_days: i32,
    priority: i32,
    is_active: bool,
) -> plans::Model {
    plans::Model {
        id,
        name: format!("Plan {}", id),
        description: None,
        price,
        duration_days,
        priority,
        is_active,
        created_at: Utc::now(),
    }
}

pub fn view(id: i32, user_id: i32, content_id: i32, points_awarded: i64) -> content_views::Model {
    content_views::Model {
        id,
        user_id,
        content_id,
        points_awarded,
        created_at: Utc::now(),
    }
}

pub fn withdrawal(
    id: i32,
    user_id: i32,
    points: i64,
    status: WithdrawalStatus,
) -> withdrawals::Model {
    withdrawals::Model {
        id,
        user_id,
        points,
        amount: Decimal::from(points) / Decimal::from(100),
        method: "PAYPAL".to_string(),
        destination: "payout@example.com".to_string(),
        status,
        transaction_id: 40 + id,
        created_at: Utc::now(),
        processed_at: None,
    }
}

/// Corps multipart/form-data construit à la main
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, mime, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
