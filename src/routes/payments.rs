use actix_web::{HttpResponse, post, web};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::payment_service::{OrderTarget, PaymentService};
use crate::services::paypal::PaymentGateway;

// product_id pour payer un produit, amount pour recharger le solde
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: Option<i32>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CaptureOrderRequest {
    pub order_id: String,
}

impl CreateOrderRequest {
    fn target(&self) -> Result<OrderTarget, AppError> {
        match (self.product_id, self.amount) {
            (Some(product_id), None) => Ok(OrderTarget::Product(product_id)),
            (None, Some(amount)) => Ok(OrderTarget::Deposit(amount)),
            _ => Err(AppError::bad_request(
                "Provide either product_id or amount, not both",
            )),
        }
    }
}

/// POST /payments/paypal/create-order
#[post("/create-order")]
pub async fn create_order(
    auth_user: AuthUser,
    body: web::Json<CreateOrderRequest>,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<dyn PaymentGateway>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let target = body.target()?;

    let order = PaymentService::create_order(
        db.get_ref(),
        gateway.get_ref(),
        auth_user.user_id,
        &config.currency,
        target,
    )
    .await?;

    Ok(HttpResponse::Created().json(order))
}

/// POST /payments/paypal/capture-order
#[post("/capture-order")]
pub async fn capture_order(
    auth_user: AuthUser,
    body: web::Json<CaptureOrderRequest>,
    db: web::Data<DatabaseConnection>,
    gateway: web::Data<dyn PaymentGateway>,
) -> Result<HttpResponse, AppError> {
    let order_id = body.order_id.trim();
    if order_id.is_empty() {
        return Err(AppError::bad_request("order_id is required"));
    }

    let captured =
        PaymentService::capture_order(db.get_ref(), gateway.get_ref(), auth_user.user_id, order_id)
            .await?;

    Ok(HttpResponse::Ok().json(captured))
}

pub fn payments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments/paypal")
            .service(create_order)
            .service(capture_order),
    );
}
