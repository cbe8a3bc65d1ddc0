// foodloop/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::OrderStatus;
use rust_decimal::Decimal;

/// Errors raised by the step pipeline itself rather than by the steps it runs.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Step '{step_name}' finished without producing {missing}")]
  MissingOutput { step_name: String, missing: &'static str },
}

/// The engine's error taxonomy.
///
/// Business-rule variants (`InsufficientStock`, `InvalidTransition`, ...) are
/// client errors and must not be retried; `Storage` wraps whatever the
/// persistence backend reported.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
  InsufficientStock { item_id: Uuid, requested: i32, available: i32 },

  #[error("Item {item_id} is no longer available")]
  ItemUnavailable { item_id: Uuid },

  #[error("Price changed for item {item_id}: expected {expected}, current {current}")]
  PriceChanged { item_id: Uuid, expected: Decimal, current: Decimal },

  #[error("Order {order_id} cannot move from {current} to {attempted}")]
  InvalidTransition {
    order_id: Uuid,
    current: OrderStatus,
    attempted: OrderStatus,
  },

  #[error("Profile {actor_id} does not own order {order_id}")]
  NotOwner { order_id: Uuid, actor_id: Uuid },

  #[error("Order {order_id} has no prior status to return to")]
  NoPriorStatus { order_id: Uuid },

  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: WorkflowError,
  },

  #[error("Storage error: {source}")]
  Storage {
    #[source]
    source: AnyhowError,
  },
}

impl EngineError {
  pub fn not_found(entity: &'static str, id: Uuid) -> Self {
    EngineError::NotFound { entity, id }
  }

  pub fn validation(message: impl Into<String>) -> Self {
    EngineError::Validation(message.into())
  }

  /// Wraps a backend error (sqlx, io, ...) as `EngineError::Storage`.
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    EngineError::Storage {
      source: AnyhowError::new(err),
    }
  }

  /// Stable snake_case reason code surfaced to clients.
  pub fn code(&self) -> &'static str {
    match self {
      EngineError::NotFound { .. } => "not_found",
      EngineError::InsufficientStock { .. } => "insufficient_stock",
      EngineError::ItemUnavailable { .. } => "unavailable",
      EngineError::PriceChanged { .. } => "price_changed",
      EngineError::InvalidTransition { .. } => "invalid_transition",
      EngineError::NotOwner { .. } => "not_owner",
      EngineError::NoPriorStatus { .. } => "no_prior_status",
      EngineError::Validation(_) => "validation_error",
      EngineError::Workflow { .. } => "workflow_error",
      EngineError::Storage { .. } => "storage_error",
    }
  }

  /// True for outcomes caused by the request rather than by the system.
  pub fn is_client_error(&self) -> bool {
    !matches!(self, EngineError::Workflow { .. } | EngineError::Storage { .. })
  }
}

impl From<AnyhowError> for EngineError {
  fn from(err: AnyhowError) -> Self {
    EngineError::Storage { source: err }
  }
}

pub type EngineResult<T, E = EngineError> = std::result::Result<T, E>;
