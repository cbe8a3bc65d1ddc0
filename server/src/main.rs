// foodloop/server/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use crate::services::rating_relay::LoggingRatingRelay;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use foodloop::{Engine, InventoryLedger};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting foodloop order service...");

  let app_state = match build_state().await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise the application.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  if app_state.config.expiry_sweep_secs > 0 {
    spawn_expiry_sweep(
      app_state.engine.ledger().clone(),
      Duration::from_secs(app_state.config.expiry_sweep_secs),
    );
  }

  let server_address = format!("{}:{}", app_state.config.server_host, app_state.config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

async fn build_state() -> AppResult<AppState> {
  let config = Arc::new(AppConfig::from_env()?);
  let store = db::connect_store(&config).await?;

  if config.seed_db {
    db::seed::seed_demo_catalog(store.as_ref()).await?;
  }

  let engine = Engine::builder(store)
    .rating_hook(Arc::new(LoggingRatingRelay::default()))
    .build()?;

  Ok(AppState {
    engine: Arc::new(engine),
    config,
  })
}

/// Periodically flips expired listings to EXPIRED, on top of the sweeps the
/// read paths already do.
fn spawn_expiry_sweep(ledger: InventoryLedger, every: Duration) {
  tracing::info!(every_secs = every.as_secs(), "Background expiry sweep enabled.");
  actix_rt::spawn(async move {
    let mut ticker = actix_rt::time::interval(every);
    loop {
      ticker.tick().await;
      if let Err(e) = ledger.expire_stale().await {
        tracing::warn!(error = %e, "Background expiry sweep failed.");
      }
    }
  });
}
