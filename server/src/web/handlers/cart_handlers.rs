// foodloop/server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use foodloop::CartLine;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ValidateCartPayload {
  pub lines: Vec<CartLine>,
}

#[instrument(name = "handler::validate_cart", skip_all, fields(lines = req_payload.lines.len()))]
pub async fn validate_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<ValidateCartPayload>,
) -> Result<HttpResponse, AppError> {
  let report = app_state.engine.validator().validate(&req_payload.lines).await?;
  info!(valid = report.valid, "Cart validated.");
  Ok(HttpResponse::Ok().json(report))
}
