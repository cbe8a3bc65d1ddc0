// foodloop/server/src/state.rs
use crate::config::AppConfig;
use foodloop::Engine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub engine: Arc<Engine>,
  pub config: Arc<AppConfig>,
}
