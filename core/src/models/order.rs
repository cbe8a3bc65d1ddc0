// foodloop/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Accepted,
  Preparing,
  ReadyForPickup,
  InTransit,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 7] = [
    OrderStatus::Pending,
    OrderStatus::Accepted,
    OrderStatus::Preparing,
    OrderStatus::ReadyForPickup,
    OrderStatus::InTransit,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Accepted => "ACCEPTED",
      OrderStatus::Preparing => "PREPARING",
      OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
      OrderStatus::InTransit => "IN_TRANSIT",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = EngineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| EngineError::validation(format!("unknown order status '{}'", s)))
  }
}

/// An order placed with a single provider.
///
/// Orders are never deleted; DELIVERED and CANCELLED orders stay for history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_profile_id: Uuid,
  pub provider_id: Uuid,
  pub status: OrderStatus,
  pub total_amount: Decimal,
  pub delivery_address: String,
  pub delivery_notes: Option<String>,
  pub payment_method: String,
  pub estimated_delivery: Option<DateTime<Utc>>,
  pub is_reviewed: bool,
  pub viewed_by_provider: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
