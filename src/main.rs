mod api;
mod config;
mod engine;
mod error;
mod geo;
mod identity;
mod models;
mod observability;
mod seed;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let (app_state, identity) = state::AppState::in_memory(&config);
    let shared_state = Arc::new(app_state);

    if config.service_role_key.is_none() {
        tracing::warn!("SERVICE_ROLE_KEY not set; rider provisioning is disabled");
    }

    if config.seed_demo_accounts {
        for account in seed::seed_demo_accounts(&shared_state, &identity).await? {
            tracing::info!(
                email = account.email,
                role = %account.role,
                token = %account.token,
                "demo account ready"
            );
        }
    }

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
