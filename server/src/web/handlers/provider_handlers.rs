// foodloop/server/src/web/handlers/provider_handlers.rs

//! Provider-side order workflow.

use actix_web::{web, HttpResponse};
use foodloop::OrderStatus;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProvider;

#[derive(Deserialize, Debug)]
pub struct ProviderOrdersQuery {
  pub status: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatePayload {
  pub status: String,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(default)]
  pub estimated_minutes: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct GoBackPayload {
  #[serde(default)]
  pub notes: Option<String>,
}

#[instrument(name = "handler::list_provider_orders", skip_all, fields(provider_id = %auth_provider.provider_id))]
pub async fn list_provider_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProviderOrdersQuery>,
  auth_provider: AuthenticatedProvider,
) -> Result<HttpResponse, AppError> {
  let status = query
    .status
    .as_deref()
    .filter(|s| !s.is_empty())
    .map(str::parse::<OrderStatus>)
    .transpose()?;
  let orders = app_state
    .engine
    .queries()
    .orders_for_provider(auth_provider.provider_id, status)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, path, req_payload, auth_provider),
  fields(order_id = %path.as_ref(), provider_id = %auth_provider.provider_id, target = %req_payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<StatusUpdatePayload>,
  auth_provider: AuthenticatedProvider,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let target: OrderStatus = payload.status.parse()?;
  let applied = app_state
    .engine
    .orders()
    .apply_transition(
      path.into_inner(),
      auth_provider.provider_id,
      target,
      payload.notes,
      payload.estimated_minutes,
    )
    .await?;
  Ok(HttpResponse::Ok().json(applied))
}

#[instrument(
  name = "handler::go_back",
  skip(app_state, path, req_payload, auth_provider),
  fields(order_id = %path.as_ref(), provider_id = %auth_provider.provider_id)
)]
pub async fn go_back_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: Option<web::Json<GoBackPayload>>,
  auth_provider: AuthenticatedProvider,
) -> Result<HttpResponse, AppError> {
  let notes = req_payload.map(|p| p.into_inner()).unwrap_or_default().notes;
  let applied = app_state
    .engine
    .orders()
    .go_back(path.into_inner(), auth_provider.provider_id, notes)
    .await?;
  Ok(HttpResponse::Ok().json(applied))
}
