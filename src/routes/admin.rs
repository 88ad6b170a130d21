use actix_web::{HttpResponse, get, patch, post, put, web};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::enums::{Role, WithdrawalStatus};
use crate::services::admin_service::{AdminService, PlanInput};
use crate::services::points_service::PointsService;

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalsQuery {
    pub status: Option<WithdrawalStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub approve: bool,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_days: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<PlanRequest> for PlanInput {
    fn from(req: PlanRequest) -> Self {
        PlanInput {
            name: req.name.trim().to_string(),
            description: req.description,
            price: req.price,
            duration_days: req.duration_days,
            priority: req.priority,
            is_active: req.is_active,
        }
    }
}

/// GET /admin/users?role=CREATOR
#[get("/users")]
pub async fn list_users(
    auth_user: AuthUser,
    query: web::Query<UsersQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_admin()?;
    let users = AdminService::list_users(db.get_ref(), query.role).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// PATCH /admin/users/{id}/role
#[patch("/users/{id}/role")]
pub async fn update_role(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<RoleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_admin()?;
    let user = AdminService::set_role(db.get_ref(), auth_user.user_id, path.into_inner(), body.role)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /admin/stats
#[get("/stats")]
pub async fn stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_admin()?;
    let stats = AdminService::stats(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /admin/withdrawals?status=PENDING
#[get("/withdrawals")]
pub async fn list_withdrawals(
    auth_user: AuthUser,
    query: web::Query<WithdrawalsQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_admin()?;
    let rows = PointsService::list_by_status(db.get_ref(), query.status).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /admin/withdrawals/{id}/review - {"approve": true|false}
#[post("/withdrawals/{id}/review")]
pub async fn review_withdrawal(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_admin()?;
    let withdrawal =
        PointsService::review_withdrawal(db.get_ref(), path.into_inner(), body.approve).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

/// POST /admin/plans
#[post("/plans")]
pub async fn create_plan(
    auth_user: AuthUser,
    body: web::Json<PlanRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_admin()?;
    let plan = AdminService::create_plan(db.get_ref(), body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(plan))
}

/// PUT /admin/plans/{id}
#[put("/plans/{id}")]
pub async fn update_plan(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<PlanRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_admin()?;
    let plan =
        AdminService::update_plan(db.get_ref(), path.into_inner(), body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(plan))
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(list_users)
            .service(update_role)
            .service(stats)
            .service(list_withdrawals)
            .service(review_withdrawal)
            .service(create_plan)
            .service(update_plan),
    );
}
