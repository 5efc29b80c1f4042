use std::sync::Arc;

use tileboard::config::AppConfig;
use tileboard::data::memory::MemoryBackend;
use tileboard::data::postgres::PgBackend;
use tileboard::services::auth::ResendMailer;
use tileboard::services::donation::{PaymentGateway, StripeGateway};
use tileboard::{db, routes, state};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let config = AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let state = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            let backend = Arc::new(PgBackend::new(pool));
            let payments = payment_gateway(&config);
            state::AppState::new(backend.clone(), backend, payments, config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-process data service, nothing is persisted");
            let backend = Arc::new(MemoryBackend::new());
            let payments = payment_gateway(&config);
            state::AppState::new(backend.clone(), backend, payments, config)
        }
    };

    let mailer_config = state.config.mailer.clone();
    let state = match mailer_config {
        Some(mailer) => state.with_mailer(Arc::new(ResendMailer::new(&mailer))),
        None => {
            tracing::warn!("RESEND_API_KEY/RESEND_FROM not set; password reset links will be logged");
            state
        }
    };

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "tileboard listening");
    axum::serve(listener, app).await.expect("server failed");
}

fn payment_gateway(config: &AppConfig) -> Option<Arc<dyn PaymentGateway>> {
    let Some(key) = config.stripe_secret_key.clone() else {
        tracing::warn!("STRIPE_SECRET_KEY not set; donations disabled");
        return None;
    };
    match StripeGateway::new(key) {
        Ok(gateway) => Some(Arc::new(gateway)),
        Err(e) => {
            tracing::error!(error = %e, "payment gateway init failed; donations disabled");
            None
        }
    }
}
