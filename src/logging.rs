use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialise les logs console. Le filtre vient de RUST_LOG s'il est défini.
/// Les logs `log` d'actix-web (middleware Logger) passent aussi par tracing.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("streamrich=info,actix_web=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
