// foodloop/server/src/web/handlers/inventory_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::item_availability", skip(app_state, path), fields(item_id = %path.as_ref()))]
pub async fn item_availability_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let availability = app_state.engine.ledger().check_availability(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(availability))
}

#[instrument(name = "handler::expire_stale", skip(app_state))]
pub async fn expire_stale_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let expired = app_state.engine.ledger().expire_stale().await?;
  info!(expired, "Expiry sweep requested over HTTP.");
  Ok(HttpResponse::Ok().json(json!({ "expired": expired })))
}
