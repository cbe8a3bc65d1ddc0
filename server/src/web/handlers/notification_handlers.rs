// foodloop/server/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProvider;

#[instrument(name = "handler::list_notifications", skip_all, fields(provider_id = %auth_provider.provider_id))]
pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  auth_provider: AuthenticatedProvider,
) -> Result<HttpResponse, AppError> {
  let relay = app_state.engine.notifications();
  let notifications = relay.list_notifications(auth_provider.provider_id).await?;
  let unviewed = notifications.iter().filter(|n| !n.viewed).count();
  Ok(HttpResponse::Ok().json(json!({
    "notifications": notifications,
    "unviewedCount": unviewed,
  })))
}

#[instrument(
  name = "handler::mark_notification_viewed",
  skip(app_state, path, auth_provider),
  fields(order_id = %path.as_ref(), provider_id = %auth_provider.provider_id)
)]
pub async fn mark_viewed_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_provider: AuthenticatedProvider,
) -> Result<HttpResponse, AppError> {
  let changed = app_state
    .engine
    .notifications()
    .mark_viewed(path.into_inner(), auth_provider.provider_id)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "changed": changed })))
}

#[instrument(name = "handler::mark_all_viewed", skip_all, fields(provider_id = %auth_provider.provider_id))]
pub async fn mark_all_viewed_handler(
  app_state: web::Data<AppState>,
  auth_provider: AuthenticatedProvider,
) -> Result<HttpResponse, AppError> {
  let updated = app_state
    .engine
    .notifications()
    .mark_all_viewed(auth_provider.provider_id)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}
