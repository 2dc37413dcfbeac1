use std::process::ExitCode;
use std::sync::Arc;

use checkout_demo::{app, AppConfig, AppState, StripeProvider};
use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkout_demo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set; webhook deliveries will be rejected");
    }

    let provider = Arc::new(StripeProvider::new(config.stripe_secret_key.clone()));
    let addr = config.socket_addr();
    let app_state = AppState::new(provider, config);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Server running at http://localhost:{}", addr.port());

    if let Err(err) = axum::serve(listener, app(app_state)).await {
        tracing::error!(error = %err, "Server exited with error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
