// foodloop/src/store/mod.rs

//! The persistence contract the engine runs against.
//!
//! Stock quantity is only ever written by the two ledger primitives
//! (`decrement_stock`, `increment_stock`) or by the checkout and transition
//! units, which apply exactly the same rules inside their own atomic boundary.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{FoodItem, Order, OrderLineItem, OrderStatus, StatusLogEntry};

/// One line of an order about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDraft {
  pub food_item_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
}

/// Everything checkout commits for one provider group.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
  pub order_id: Uuid,
  pub user_profile_id: Uuid,
  pub provider_id: Uuid,
  pub total_amount: Decimal,
  pub delivery_address: String,
  pub delivery_notes: Option<String>,
  pub payment_method: String,
  pub initial_note: String,
  pub created_at: DateTime<Utc>,
  pub lines: Vec<LineDraft>,
}

impl OrderDraft {
  /// The rows a successful commit produces: a PENDING order, its line items
  /// and the first status log entry.
  pub fn to_records(&self) -> PlacedOrder {
    let order = Order {
      id: self.order_id,
      user_profile_id: self.user_profile_id,
      provider_id: self.provider_id,
      status: OrderStatus::Pending,
      total_amount: self.total_amount,
      delivery_address: self.delivery_address.clone(),
      delivery_notes: self.delivery_notes.clone(),
      payment_method: self.payment_method.clone(),
      estimated_delivery: None,
      is_reviewed: false,
      viewed_by_provider: false,
      created_at: self.created_at,
      updated_at: self.created_at,
    };
    let line_items = self
      .lines
      .iter()
      .map(|line| OrderLineItem {
        id: Uuid::new_v4(),
        order_id: self.order_id,
        food_item_id: line.food_item_id,
        quantity: line.quantity,
        price: line.price,
      })
      .collect();
    let status_log = StatusLogEntry {
      id: Uuid::new_v4(),
      order_id: self.order_id,
      status: OrderStatus::Pending,
      notes: Some(self.initial_note.clone()),
      created_at: self.created_at,
    };
    PlacedOrder {
      order,
      line_items,
      status_log,
    }
  }

  /// Stock to take, one entry per item in ascending item id. Writers that
  /// lock rows take them in this order, so two checkouts over the same items
  /// cannot wait on each other.
  pub fn stock_decrements(&self) -> EngineResult<Vec<(Uuid, i32)>> {
    let mut totals: Vec<(Uuid, i32)> = Vec::with_capacity(self.lines.len());
    for line in &self.lines {
      match totals.iter_mut().find(|(id, _)| *id == line.food_item_id) {
        Some((_, total)) => {
          *total = total.checked_add(line.quantity).ok_or_else(|| {
            EngineError::validation(format!("quantity for item {} is too large", line.food_item_id))
          })?;
        }
        None => totals.push((line.food_item_id, line.quantity)),
      }
    }
    totals.sort_by_key(|(id, _)| *id);
    Ok(totals)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
  pub order: Order,
  pub line_items: Vec<OrderLineItem>,
  pub status_log: StatusLogEntry,
}

/// What a planner decided to write for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
  pub status: OrderStatus,
  pub notes: String,
  /// Replaces the stored estimate when set; left untouched otherwise.
  pub estimated_delivery: Option<DateTime<Utc>>,
  /// Put every line item's quantity back on the shelf.
  pub restore_inventory: bool,
}

/// Decides a status change from the locked order and its history (newest first).
pub type TransitionPlanner =
  Box<dyn FnOnce(&Order, &[StatusLogEntry]) -> EngineResult<StatusChange> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoredStock {
  pub food_item_id: Uuid,
  pub quantity: i32,
  /// The item went from SOLD back to ACTIVE.
  pub relisted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedChange {
  pub order: Order,
  pub previous_status: OrderStatus,
  pub entry: StatusLogEntry,
  pub restored: Vec<RestoredStock>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  // --- catalog ---

  /// Inserts or replaces a food item.
  async fn save_food_item(&self, item: FoodItem) -> EngineResult<()>;

  async fn food_item(&self, item_id: Uuid) -> EngineResult<Option<FoodItem>>;

  /// Items with the given ids; missing ids are simply absent from the result.
  async fn food_items(&self, item_ids: &[Uuid]) -> EngineResult<Vec<FoodItem>>;

  /// Flips ACTIVE items whose `expires_at < now` to EXPIRED. Returns how many changed.
  async fn expire_stale(&self, now: DateTime<Utc>) -> EngineResult<u64>;

  // --- ledger primitives ---

  /// Subtracts `amount` only where `quantity >= amount`; otherwise
  /// `InsufficientStock`. An item depleted to zero is marked SOLD.
  async fn decrement_stock(&self, item_id: Uuid, amount: i32) -> EngineResult<FoodItem>;

  /// Adds `amount`; a SOLD item that has not expired is re-listed as ACTIVE.
  async fn increment_stock(&self, item_id: Uuid, amount: i32, now: DateTime<Utc>) -> EngineResult<RestoredStock>;

  // --- atomic units ---

  /// Writes order, line items and initial log entry and decrements every
  /// line's item. Nothing is written if any decrement fails.
  async fn commit_checkout(&self, draft: OrderDraft) -> EngineResult<PlacedOrder>;

  /// Serialized per order: locks the order, hands it and its history to
  /// `planner`, then writes the resulting change in one atomic unit.
  async fn apply_status_change(
    &self,
    order_id: Uuid,
    now: DateTime<Utc>,
    planner: TransitionPlanner,
  ) -> EngineResult<AppliedChange>;

  // --- reads ---

  async fn order(&self, order_id: Uuid) -> EngineResult<Option<Order>>;

  async fn line_items(&self, order_id: Uuid) -> EngineResult<Vec<OrderLineItem>>;

  async fn line_items_for_orders(&self, order_ids: &[Uuid]) -> EngineResult<Vec<OrderLineItem>>;

  /// Most recent entries first; `limit` caps the count.
  async fn status_history(&self, order_id: Uuid, limit: Option<usize>) -> EngineResult<Vec<StatusLogEntry>>;

  /// Newest first.
  async fn orders_for_user(&self, user_profile_id: Uuid) -> EngineResult<Vec<Order>>;

  /// Newest first, optionally restricted to one status.
  async fn orders_for_provider(&self, provider_id: Uuid, status: Option<OrderStatus>) -> EngineResult<Vec<Order>>;

  // --- flags ---

  /// Returns false when the order was already viewed. `NotFound` if missing.
  async fn mark_viewed(&self, order_id: Uuid) -> EngineResult<bool>;

  /// Marks every unviewed order of the provider; returns how many changed.
  async fn mark_all_viewed(&self, provider_id: Uuid) -> EngineResult<u64>;

  /// Sets `is_reviewed` only if it is still false; returns whether it changed.
  async fn mark_reviewed(&self, order_id: Uuid) -> EngineResult<bool>;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(lines: &[(Uuid, i32)]) -> OrderDraft {
    OrderDraft {
      order_id: Uuid::new_v4(),
      user_profile_id: Uuid::new_v4(),
      provider_id: Uuid::new_v4(),
      total_amount: Decimal::ZERO,
      delivery_address: "1 Harbour St".to_string(),
      delivery_notes: None,
      payment_method: "CARD".to_string(),
      initial_note: "Order placed by customer".to_string(),
      created_at: Utc::now(),
      lines: lines
        .iter()
        .map(|(food_item_id, quantity)| LineDraft {
          food_item_id: *food_item_id,
          quantity: *quantity,
          price: Decimal::ONE,
        })
        .collect(),
    }
  }

  #[test]
  fn decrements_are_merged_and_sorted_by_item_id() {
    let low = Uuid::from_u128(1);
    let high = Uuid::from_u128(2);
    let in_cart_order = draft(&[(high, 1), (low, 2), (high, 3)]);
    let in_reverse_order = draft(&[(low, 2), (high, 4)]);

    let expected = vec![(low, 2), (high, 4)];
    assert_eq!(in_cart_order.stock_decrements().unwrap(), expected);
    assert_eq!(in_reverse_order.stock_decrements().unwrap(), expected);
  }

  #[test]
  fn overflowing_decrement_is_a_validation_error() {
    let soup = Uuid::new_v4();
    let err = draft(&[(soup, i32::MAX), (soup, 1)]).stock_decrements().unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
  }
}
