//! qr-cloud: QR table ordering for restaurants
//!
//! One HTTP service that:
//! - Opens table sessions from QR codes and takes customer orders, staff
//!   calls and zone requests
//! - Serves the staff dashboard API (JWT authenticated) with a live SSE feed
//! - Sells plan subscriptions through the payment gateway and handles its webhooks
//! - Answers menu questions through the LLM assistant

mod api;
mod auth;
mod config;
mod db;
mod error;
mod gateway;
mod live;
mod llm;
mod state;
mod storage;
mod util;

use std::net::SocketAddr;

use config::Config;
use db::BoxError;
use state::AppState;

/// Rate limiter windows and idle live channels are swept this often
const HOUSEKEEPING_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qr_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting qr-cloud (env: {})", config.environment);
    if config.is_development() {
        tracing::warn!("Development mode: unset secrets fall back to placeholders");
    }

    let state = AppState::new(&config).await?;

    let rate_limiter = state.rate_limiter.clone();
    let live = state.live.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(HOUSEKEEPING_INTERVAL_SECS));
        loop {
            interval.tick().await;
            rate_limiter.prune();
            live.prune();
        }
    });

    let app = api::build_app(state, &config.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("qr-cloud HTTP listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
