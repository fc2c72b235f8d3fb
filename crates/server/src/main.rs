mod config;
mod state;
mod twiml;
mod webhook;

use std::sync::Arc;

use tracing::info;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new("reembolso".into(), std::io::stdout))
        .init();

    let config = Config::load()?;
    config.require_credentials()?;

    let listen = config.listen.clone();
    let state = Arc::new(AppState::from_config(config)?);
    info!(
        workbook = %state.workbook.lock().map(|w| w.path().display().to_string()).unwrap_or_default(),
        "reimbursement workbook ready"
    );

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!(%listen, "listening");
    axum::serve(listener, webhook::router(state)).await?;
    Ok(())
}
