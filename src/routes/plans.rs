use actix_web::{HttpResponse, get, web};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::services::promotion_service::PromotionService;

/// GET /plans - Plans de mise en avant disponibles (PUBLIC)
#[get("/plans")]
pub async fn list_plans(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let plans = PromotionService::active_plans(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(plans))
}
