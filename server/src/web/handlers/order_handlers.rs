// foodloop/server/src/web/handlers/order_handlers.rs

//! Customer-side order endpoints. Order details and history are also open
//! to the order's provider.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, AuthenticatedViewer};

#[derive(Deserialize, Debug)]
pub struct HistoryQuery {
  pub limit: Option<usize>,
}

#[instrument(name = "handler::list_user_orders", skip_all, fields(user_profile_id = %auth_user.user_profile_id))]
pub async fn list_user_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.engine.queries().orders_for_user(auth_user.user_profile_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, path, viewer),
  fields(order_id = %path.as_ref(), viewer = ?viewer.0)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  viewer: AuthenticatedViewer,
) -> Result<HttpResponse, AppError> {
  let view = app_state
    .engine
    .queries()
    .order_details(path.into_inner(), viewer.0)
    .await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(
  name = "handler::order_history",
  skip(app_state, path, query, viewer),
  fields(order_id = %path.as_ref(), viewer = ?viewer.0)
)]
pub async fn order_history_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  query: web::Query<HistoryQuery>,
  viewer: AuthenticatedViewer,
) -> Result<HttpResponse, AppError> {
  let history = app_state
    .engine
    .queries()
    .status_history(path.into_inner(), viewer.0, query.limit)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "history": history })))
}

#[instrument(
  name = "handler::cancel_order",
  skip(app_state, path, auth_user),
  fields(order_id = %path.as_ref(), user_profile_id = %auth_user.user_profile_id)
)]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let applied = app_state
    .engine
    .orders()
    .cancel_as_customer(path.into_inner(), auth_user.user_profile_id)
    .await?;
  Ok(HttpResponse::Ok().json(applied))
}

#[instrument(
  name = "handler::review_order",
  skip(app_state, path, auth_user),
  fields(order_id = %path.as_ref(), user_profile_id = %auth_user.user_profile_id)
)]
pub async fn review_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .engine
    .reviews()
    .mark_reviewed(path.into_inner(), auth_user.user_profile_id)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}
