use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tokio_util::io::ReaderStream;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::PageQuery;
use crate::models::enums::Role;
use crate::models::{product_purchases, products};
use crate::services::product_service::ProductService;
use crate::services::purchase_service::PurchaseService;
use crate::services::upload_service::{self, UploadKind};

// Un achat avec le produit associé (None si le produit a été supprimé)
#[derive(Serialize)]
pub struct PurchaseResponse {
    #[serde(flatten)]
    pub purchase: product_purchases::Model,
    pub product: Option<products::Model>,
}

/// GET /products - Vitrine (PUBLIC)
#[get("")]
pub async fn list_products(
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let page = ProductService::list(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /products/{id} (PUBLIC)
#[get("/{id}")]
pub async fn get_product(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let product = PurchaseService::find_active_product(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

/// POST /products - Création multipart (CREATOR, ADMIN)
/// Champs: title, description?, price, file
#[post("")]
pub async fn create_product(
    auth_user: AuthUser,
    payload: Multipart,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    auth_user.require_role(&[Role::Creator])?;

    let form = upload_service::read_multipart(payload, UploadKind::Product, config.max_upload_bytes)
        .await?;
    let product =
        ProductService::create(db.get_ref(), auth_user.user_id, &config.upload_dir, form).await?;

    Ok(HttpResponse::Created().json(product))
}

/// POST /products/{id}/purchase - Achat avec le solde
#[post("/{id}/purchase")]
pub async fn purchase_product(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let purchase = PurchaseService::purchase_product(
        db.get_ref(),
        auth_user.user_id,
        path.into_inner(),
        &config.currency,
    )
    .await?;

    Ok(HttpResponse::Created().json(purchase))
}

/// GET /products/{id}/download - Fichier en pièce jointe (acheteur, créateur, ADMIN)
#[get("/{id}/download")]
pub async fn download_product(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let download = ProductService::download(db.get_ref(), &auth_user, path.into_inner()).await?;

    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(download.file_name)],
    };

    Ok(HttpResponse::Ok()
        .content_type(download.mime_type)
        .insert_header(disposition)
        .no_chunking(download.size)
        .streaming(ReaderStream::new(download.file)))
}

/// GET /purchases - Achats de l'utilisateur connecté
#[get("/purchases")]
pub async fn list_purchases(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let rows = PurchaseService::list_for_user(db.get_ref(), auth_user.user_id).await?;

    let response: Vec<PurchaseResponse> = rows
        .into_iter()
        .map(|(purchase, product)| PurchaseResponse { purchase, product })
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

pub fn products_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .service(list_products)
            .service(create_product)
            .service(get_product)
            .service(purchase_product)
            .service(download_product),
    )
    .service(list_purchases);
}
