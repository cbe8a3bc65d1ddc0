// foodloop/src/models/food_item.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodItemStatus {
  Active,
  Sold,
  Expired,
}

impl FoodItemStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      FoodItemStatus::Active => "ACTIVE",
      FoodItemStatus::Sold => "SOLD",
      FoodItemStatus::Expired => "EXPIRED",
    }
  }
}

impl fmt::Display for FoodItemStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FoodItemStatus {
  type Err = EngineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ACTIVE" => Ok(FoodItemStatus::Active),
      "SOLD" => Ok(FoodItemStatus::Sold),
      "EXPIRED" => Ok(FoodItemStatus::Expired),
      other => Err(EngineError::validation(format!("unknown food item status '{}'", other))),
    }
  }
}

/// A listed surplus item. `quantity` never drops below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
  pub id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub discounted_price: Decimal,
  pub quantity: i32,
  pub status: FoodItemStatus,
  pub expires_at: DateTime<Utc>,
  pub provider_id: Uuid,
  pub category_id: Option<Uuid>,
}

impl FoodItem {
  /// The single availability rule used everywhere: listed as ACTIVE, not yet
  /// expired, and at least one unit left. A stored ACTIVE status with zero
  /// quantity is still unavailable.
  pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
    self.status == FoodItemStatus::Active && self.expires_at > now && self.quantity > 0
  }
}
