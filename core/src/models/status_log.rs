// foodloop/src/models/status_log.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::OrderStatus;

/// Append-only audit row. The newest entry for an order always carries the
/// order's current status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLogEntry {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: OrderStatus,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
}
