use actix_web::{HttpResponse, get, post, web};
use sea_orm::*;
use serde::Deserialize;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::profiles;
use crate::services::points_service::{PointsPolicy, PointsService, WithdrawalRequest};
use crate::services::wallet_service::WalletService;

/// Moyens de versement acceptés
const PAYOUT_METHODS: &[&str] = &["PAYPAL", "BANK_TRANSFER"];

// DTO pour une demande de retrait
#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawalBody {
    #[validate(range(min = 1, message = "points must be positive"))]
    pub points: i64,
    pub method: Option<String>,
    // Par défaut: payout_email du profil
    #[validate(length(min = 3, max = 255))]
    pub destination: Option<String>,
}

/// GET /wallet/balance - Solde, points et valeur des points
#[get("/balance")]
pub async fn get_balance(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let summary = WalletService::summary(
        db.get_ref(),
        auth_user.user_id,
        &config.currency,
        config.points_per_dollar,
    )
    .await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// GET /wallet/transactions - Historique du ledger
#[get("/transactions")]
pub async fn get_transactions(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let history = WalletService::history(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// POST /withdrawals - Conversion de points en argent
#[post("")]
pub async fn request_withdrawal(
    auth_user: AuthUser,
    body: web::Json<WithdrawalBody>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let method = body
        .method
        .map(|m| m.trim().to_uppercase())
        .unwrap_or_else(|| "PAYPAL".to_string());
    if !PAYOUT_METHODS.contains(&method.as_str()) {
        return Err(AppError::bad_request(format!(
            "Invalid method. Must be one of: {}",
            PAYOUT_METHODS.join(", ")
        )));
    }

    let destination = match body.destination {
        Some(d) => d.trim().to_string(),
        None => profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(auth_user.user_id))
            .one(db.get_ref())
            .await?
            .and_then(|p| p.payout_email)
            .ok_or_else(|| {
                AppError::bad_request("No destination given and no payout email in profile")
            })?,
    };

    let policy = PointsPolicy {
        points_per_dollar: config.points_per_dollar,
        min_withdrawal_points: config.min_withdrawal_points,
    };

    let withdrawal = PointsService::request_withdrawal(
        db.get_ref(),
        &policy,
        &config.currency,
        auth_user.user_id,
        WithdrawalRequest {
            points: body.points,
            method,
            destination,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(withdrawal))
}

/// GET /withdrawals - Retraits de l'utilisateur connecté
#[get("")]
pub async fn list_withdrawals(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let rows = PointsService::list_for_user(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub fn wallet_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .service(get_balance)
            .service(get_transactions),
    )
    .service(
        web::scope("/withdrawals")
            .service(request_withdrawal)
            .service(list_withdrawals),
    );
}
