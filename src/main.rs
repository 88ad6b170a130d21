use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};

use streamrich::config::AppConfig;
use streamrich::services::paypal::{PayPalClient, PaymentGateway};
use streamrich::{db, logging, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::other(e.to_string())
    })?;

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config).await.map_err(|e| {
        tracing::error!(error = %e, "failed to connect to database");
        std::io::Error::other(e.to_string())
    })?;
    tracing::info!("database connected");

    if config.auto_migrate {
        db::sync_schema(&db)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let paypal = PayPalClient::new(config.paypal.clone())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let gateway: web::Data<dyn PaymentGateway> =
        web::Data::from(Arc::new(paypal) as Arc<dyn PaymentGateway>);

    let bind_addr = config.bind_addr.clone();
    let db = web::Data::new(db);
    let config = web::Data::new(config);

    tracing::info!(addr = %bind_addr, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(gateway.clone())
            .configure(routes::configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
