pub mod admin;
pub mod auth;
pub mod content;
pub mod health;
pub mod payments;
pub mod plans;
pub mod products;
pub mod profile;
pub mod wallet;

use actix_web::{HttpRequest, error, web};

use crate::error::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .service(health::health_check)
            .service(plans::list_plans)
            .configure(auth::auth_routes)
            .configure(profile::profile_routes)
            .configure(content::content_routes)
            .configure(products::products_routes)
            .configure(payments::payments_routes)
            .configure(wallet::wallet_routes)
            .configure(admin::admin_routes),
    );
}

// Corps JSON invalide -> {"error": "..."} comme les autres erreurs
fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid JSON body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid query string: {}", err)).into()
}
