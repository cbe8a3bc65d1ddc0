// foodloop/server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use foodloop::{CartLine, CheckoutRequest, DeliveryInfo};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
  pub lines: Vec<CartLine>,
  pub delivery_address: String,
  #[serde(default)]
  pub delivery_notes: Option<String>,
  pub payment_method: String,
}

/// 201 when at least one provider group produced an order, 409 when none did.
#[instrument(
  name = "handler::checkout",
  skip(app_state, req_payload, auth_user),
  fields(user_profile_id = %auth_user.user_profile_id, lines = req_payload.lines.len())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CheckoutPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let outcome = app_state
    .engine
    .checkout()
    .checkout(CheckoutRequest {
      user_profile_id: auth_user.user_profile_id,
      lines: payload.lines,
      delivery: DeliveryInfo {
        address: payload.delivery_address,
        notes: payload.delivery_notes,
      },
      payment_method: payload.payment_method,
    })
    .await?;

  if outcome.orders.is_empty() {
    warn!(failures = outcome.failures.len(), "Checkout produced no orders.");
    return Ok(HttpResponse::Conflict().json(json!({
      "error": "No order could be placed.",
      "code": "checkout_failed",
      "orders": outcome.orders,
      "failures": outcome.failures,
    })));
  }

  info!(
    orders = outcome.orders.len(),
    failures = outcome.failures.len(),
    "Checkout completed."
  );
  Ok(HttpResponse::Created().json(outcome))
}
