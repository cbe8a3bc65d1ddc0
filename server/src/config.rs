// foodloop/server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Absent means the in-memory store is used.
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  /// Insert a small demo catalog on startup.
  pub seed_db: bool,
  /// Seconds between background expiry sweeps; 0 disables the background task.
  pub expiry_sweep_secs: u64,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      db_max_connections: 5,
      seed_db: false,
      expiry_sweep_secs: 0,
    }
  }
}

/// Reads `var_name`, falling back to `default` when unset.
fn parse_env<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(var_name) {
    Ok(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
    Err(_) => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let defaults = Self::default();
    let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = parse_env("SERVER_PORT", defaults.server_port)?;
    let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
    let db_max_connections = parse_env("DB_MAX_CONNECTIONS", defaults.db_max_connections)?;
    let seed_db = parse_env("SEED_DB", defaults.seed_db)?;
    let expiry_sweep_secs = parse_env("EXPIRY_SWEEP_SECS", defaults.expiry_sweep_secs)?;

    if db_max_connections == 0 {
      return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
    }

    tracing::info!("Application configuration loaded successfully.");
    // DATABASE_URL carries credentials; only its presence is logged.
    tracing::debug!(
      server_host = %server_host,
      server_port,
      database_configured = database_url.is_some(),
      db_max_connections,
      seed_db,
      expiry_sweep_secs,
      "Loaded config details"
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      seed_db,
      expiry_sweep_secs,
    })
  }
}
