// foodloop/server/src/db/mod.rs

pub mod pg_store;
pub mod seed;

pub use pg_store::PgStore;

use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use foodloop::{MemoryStore, OrderStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Builds the store the engine runs against: Postgres when `DATABASE_URL` is
/// set (migrations applied on connect), otherwise the in-memory store.
pub async fn connect_store(config: &AppConfig) -> AppResult<Arc<dyn OrderStore>> {
  let Some(database_url) = config.database_url.as_deref() else {
    tracing::warn!("DATABASE_URL not set; using the in-memory store. Data is lost on restart.");
    return Ok(Arc::new(MemoryStore::new()));
  };

  let pool = PgPoolOptions::new()
    .max_connections(config.db_max_connections)
    .connect(database_url)
    .await?;
  tracing::info!("Successfully connected to the database.");

  sqlx::migrate!("./migrations").run(&pool).await?;
  tracing::info!("Database migrations applied.");

  Ok(Arc::new(PgStore::new(pool)))
}
