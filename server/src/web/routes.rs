// foodloop/server/src/web/routes.rs

use actix_web::{error, web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{
  cart_handlers, checkout_handlers, inventory_handlers, notification_handlers, order_handlers, provider_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed bodies and query strings get the same `{error, code}` shape as everything else.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .error_handler(|err: error::JsonPayloadError, _req| AppError::Validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
  web::QueryConfig::default()
    .error_handler(|err: error::QueryPayloadError, _req| AppError::Validation(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
  web::PathConfig::default()
    .error_handler(|err: error::PathError, _req| AppError::Validation(err.to_string()).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .app_data(json_config())
      .app_data(query_config())
      .app_data(path_config())
      .route("/health", web::get().to(health_check_handler))
      .route(
        "/items/{item_id}/availability",
        web::get().to(inventory_handlers::item_availability_handler),
      )
      .route(
        "/inventory/expire-stale",
        web::post().to(inventory_handlers::expire_stale_handler),
      )
      .route("/cart/validate", web::post().to(cart_handlers::validate_cart_handler))
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      // Customer orders
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_user_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/history", web::get().to(order_handlers::order_history_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{order_id}/review", web::post().to(order_handlers::review_order_handler)),
      )
      // Provider workflow
      .service(
        web::scope("/provider")
          .route("/orders", web::get().to(provider_handlers::list_provider_orders_handler))
          .route(
            "/orders/{order_id}/status",
            web::post().to(provider_handlers::update_order_status_handler),
          )
          .route("/orders/{order_id}/go-back", web::post().to(provider_handlers::go_back_handler))
          .route(
            "/notifications",
            web::get().to(notification_handlers::list_notifications_handler),
          )
          .route(
            "/notifications/viewed",
            web::post().to(notification_handlers::mark_all_viewed_handler),
          )
          .route(
            "/notifications/{order_id}/viewed",
            web::post().to(notification_handlers::mark_viewed_handler),
          ),
      ),
  );
}
