use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, web};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::PageQuery;
use crate::models::enums::Role;
use crate::services::content_service::ContentService;
use crate::services::points_service::PointsService;
use crate::services::promotion_service::PromotionService;
use crate::services::upload_service::{self, UploadKind};

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub plan_id: i32,
}

/// GET /content - Liste paginée (PUBLIC)
#[get("")]
pub async fn list_content(
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let page = ContentService::list(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /content/{id} (PUBLIC)
#[get("/{id}")]
pub async fn get_content(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let item = ContentService::get(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// POST /content - Upload multipart (CREATOR, ADMIN)
/// Champs: title, description?, points_reward?, file
#[post("")]
pub async fn upload_content(
    auth_user: AuthUser,
    payload: Multipart,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_role(&[Role::Creator])?;

    let form = upload_service::read_multipart(payload, UploadKind::Content, config.max_upload_bytes)
        .await?;
    let item =
        ContentService::create(db.get_ref(), auth_user.user_id, &config.upload_dir, form).await?;

    Ok(HttpResponse::Created().json(item))
}

/// DELETE /content/{id} (propriétaire ou ADMIN)
#[delete("/{id}")]
pub async fn delete_content(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    ContentService::delete(db.get_ref(), &auth_user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /content/{id}/view - Enregistre une vue et crédite les points (STREAMER)
#[post("/{id}/view")]
pub async fn view_content(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_role(&[Role::Streamer])?;

    let outcome =
        PointsService::record_view(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /content/{id}/promote - Achat d'un plan de mise en avant (CREATOR, ADMIN)
#[post("/{id}/promote")]
pub async fn promote_content(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<PromoteRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_role(&[Role::Creator])?;

    let outcome = PromotionService::promote_content(
        db.get_ref(),
        &auth_user,
        path.into_inner(),
        body.plan_id,
        &config.currency,
    )
    .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

pub fn content_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/content")
            .service(list_content)
            .service(upload_content)
            .service(get_content)
            .service(delete_content)
            .service(view_content)
            .service(promote_content),
    );
}
