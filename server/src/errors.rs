// foodloop/server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use foodloop::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error(transparent)]
  Engine(#[from] EngineError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// Stable machine-readable reason, sent as `code` in error bodies.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_error",
      AppError::Auth(_) => "unauthorized",
      AppError::Config(_) => "config_error",
      AppError::Sqlx(_) | AppError::Migrate(_) => "storage_error",
      AppError::Engine(e) => e.code(),
      AppError::Internal(_) => "internal_error",
    }
  }
}

fn engine_status(err: &EngineError) -> StatusCode {
  match err {
    EngineError::Validation(_) => StatusCode::BAD_REQUEST,
    EngineError::NotOwner { .. } => StatusCode::FORBIDDEN,
    EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
    EngineError::InsufficientStock { .. }
    | EngineError::ItemUnavailable { .. }
    | EngineError::PriceChanged { .. }
    | EngineError::InvalidTransition { .. }
    | EngineError::NoPriorStatus { .. } => StatusCode::CONFLICT,
    EngineError::Workflow { .. } | EngineError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Engine(e) => engine_status(e),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
      // Internal details stay in the logs.
      return HttpResponse::build(status).json(json!({"error": "An internal error occurred", "code": self.code()}));
    }
    tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    HttpResponse::build(status).json(json!({"error": self.to_string(), "code": self.code()}))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
