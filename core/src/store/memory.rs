// foodloop/src/store/memory.rs

//! In-process `OrderStore`.
//!
//! One mutex guards every table, so each trait call is atomic and calls on
//! the same order are serialized. Units that touch several items work on a
//! copy of those items and only write it back once every step succeeded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use super::{AppliedChange, OrderDraft, OrderStore, PlacedOrder, RestoredStock, TransitionPlanner};
use crate::error::{EngineError, EngineResult};
use crate::models::{FoodItem, FoodItemStatus, Order, OrderLineItem, OrderStatus, StatusLogEntry};

#[derive(Debug, Default)]
struct Tables {
  items: HashMap<Uuid, FoodItem>,
  orders: HashMap<Uuid, Order>,
  /// Order ids in insertion order.
  order_sequence: Vec<Uuid>,
  line_items: Vec<OrderLineItem>,
  /// Append-only, oldest first.
  status_logs: Vec<StatusLogEntry>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_items(items: impl IntoIterator<Item = FoodItem>) -> Self {
    let store = Self::new();
    {
      let mut tables = store.tables.lock();
      for item in items {
        tables.items.insert(item.id, item);
      }
    }
    store
  }

  /// Total number of status log rows, across all orders.
  pub fn status_log_len(&self) -> usize {
    self.tables.lock().status_logs.len()
  }

  /// Total number of orders.
  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  fn newest_first(tables: &Tables, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
    let mut orders: Vec<Order> = tables
      .order_sequence
      .iter()
      .rev()
      .filter_map(|id| tables.orders.get(id))
      .filter(|order| keep(order))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
  }
}

fn ensure_positive(amount: i32) -> EngineResult<()> {
  if amount <= 0 {
    return Err(EngineError::validation(format!("stock amount must be positive, got {}", amount)));
  }
  Ok(())
}

/// Conditional decrement against a working set of items.
fn decrement_in(items: &mut HashMap<Uuid, FoodItem>, item_id: Uuid, amount: i32) -> EngineResult<FoodItem> {
  ensure_positive(amount)?;
  let item = items
    .get_mut(&item_id)
    .ok_or_else(|| EngineError::not_found("food item", item_id))?;
  if item.quantity < amount {
    return Err(EngineError::InsufficientStock {
      item_id,
      requested: amount,
      available: item.quantity,
    });
  }
  item.quantity -= amount;
  if item.quantity == 0 && item.status == FoodItemStatus::Active {
    item.status = FoodItemStatus::Sold;
  }
  Ok(item.clone())
}

fn increment_in(
  items: &mut HashMap<Uuid, FoodItem>,
  item_id: Uuid,
  amount: i32,
  now: DateTime<Utc>,
) -> EngineResult<RestoredStock> {
  ensure_positive(amount)?;
  let item = items
    .get_mut(&item_id)
    .ok_or_else(|| EngineError::not_found("food item", item_id))?;
  item.quantity += amount;
  let relisted = item.status == FoodItemStatus::Sold && item.expires_at > now;
  if relisted {
    item.status = FoodItemStatus::Active;
  }
  Ok(RestoredStock {
    food_item_id: item_id,
    quantity: amount,
    relisted,
  })
}

/// Copies the listed items out of the table so a unit can fail without side effects.
fn working_copy(tables: &Tables, item_ids: impl IntoIterator<Item = Uuid>) -> HashMap<Uuid, FoodItem> {
  item_ids
    .into_iter()
    .filter_map(|id| tables.items.get(&id).map(|item| (id, item.clone())))
    .collect()
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn save_food_item(&self, item: FoodItem) -> EngineResult<()> {
    if item.quantity < 0 {
      return Err(EngineError::validation("food item quantity cannot be negative"));
    }
    self.tables.lock().items.insert(item.id, item);
    Ok(())
  }

  async fn food_item(&self, item_id: Uuid) -> EngineResult<Option<FoodItem>> {
    Ok(self.tables.lock().items.get(&item_id).cloned())
  }

  async fn food_items(&self, item_ids: &[Uuid]) -> EngineResult<Vec<FoodItem>> {
    let tables = self.tables.lock();
    Ok(item_ids.iter().filter_map(|id| tables.items.get(id).cloned()).collect())
  }

  async fn expire_stale(&self, now: DateTime<Utc>) -> EngineResult<u64> {
    let mut tables = self.tables.lock();
    let mut expired = 0;
    for item in tables.items.values_mut() {
      if item.status == FoodItemStatus::Active && item.expires_at < now {
        item.status = FoodItemStatus::Expired;
        expired += 1;
      }
    }
    Ok(expired)
  }

  async fn decrement_stock(&self, item_id: Uuid, amount: i32) -> EngineResult<FoodItem> {
    let mut tables = self.tables.lock();
    decrement_in(&mut tables.items, item_id, amount)
  }

  async fn increment_stock(&self, item_id: Uuid, amount: i32, now: DateTime<Utc>) -> EngineResult<RestoredStock> {
    let mut tables = self.tables.lock();
    increment_in(&mut tables.items, item_id, amount, now)
  }

  async fn commit_checkout(&self, draft: OrderDraft) -> EngineResult<PlacedOrder> {
    let mut tables = self.tables.lock();

    let decrements = draft.stock_decrements()?;
    let mut working = working_copy(&tables, decrements.iter().map(|(id, _)| *id));
    for (item_id, quantity) in decrements {
      decrement_in(&mut working, item_id, quantity)?;
    }

    let placed = draft.to_records();
    tables.items.extend(working);
    tables.orders.insert(placed.order.id, placed.order.clone());
    tables.order_sequence.push(placed.order.id);
    tables.line_items.extend(placed.line_items.iter().cloned());
    tables.status_logs.push(placed.status_log.clone());
    Ok(placed)
  }

  async fn apply_status_change(
    &self,
    order_id: Uuid,
    now: DateTime<Utc>,
    planner: TransitionPlanner,
  ) -> EngineResult<AppliedChange> {
    let mut tables = self.tables.lock();

    let mut order = tables
      .orders
      .get(&order_id)
      .cloned()
      .ok_or_else(|| EngineError::not_found("order", order_id))?;
    let history: Vec<StatusLogEntry> = tables
      .status_logs
      .iter()
      .rev()
      .filter(|entry| entry.order_id == order_id)
      .cloned()
      .collect();

    let change = planner(&order, &history)?;

    let mut restored = Vec::new();
    let mut working = HashMap::new();
    if change.restore_inventory {
      let lines: Vec<(Uuid, i32)> = tables
        .line_items
        .iter()
        .filter(|line| line.order_id == order_id)
        .map(|line| (line.food_item_id, line.quantity))
        .collect();
      working = working_copy(&tables, lines.iter().map(|(id, _)| *id));
      for (food_item_id, quantity) in lines {
        restored.push(increment_in(&mut working, food_item_id, quantity, now)?);
      }
    }

    let previous_status = order.status;
    order.status = change.status;
    order.updated_at = now;
    if change.estimated_delivery.is_some() {
      order.estimated_delivery = change.estimated_delivery;
    }
    let entry = StatusLogEntry {
      id: Uuid::new_v4(),
      order_id,
      status: change.status,
      notes: Some(change.notes),
      created_at: now,
    };

    tables.items.extend(working);
    tables.orders.insert(order_id, order.clone());
    tables.status_logs.push(entry.clone());

    Ok(AppliedChange {
      order,
      previous_status,
      entry,
      restored,
    })
  }

  async fn order(&self, order_id: Uuid) -> EngineResult<Option<Order>> {
    Ok(self.tables.lock().orders.get(&order_id).cloned())
  }

  async fn line_items(&self, order_id: Uuid) -> EngineResult<Vec<OrderLineItem>> {
    let tables = self.tables.lock();
    Ok(tables.line_items.iter().filter(|l| l.order_id == order_id).cloned().collect())
  }

  async fn line_items_for_orders(&self, order_ids: &[Uuid]) -> EngineResult<Vec<OrderLineItem>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .line_items
        .iter()
        .filter(|l| order_ids.contains(&l.order_id))
        .cloned()
        .collect(),
    )
  }

  async fn status_history(&self, order_id: Uuid, limit: Option<usize>) -> EngineResult<Vec<StatusLogEntry>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .status_logs
        .iter()
        .rev()
        .filter(|entry| entry.order_id == order_id)
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect(),
    )
  }

  async fn orders_for_user(&self, user_profile_id: Uuid) -> EngineResult<Vec<Order>> {
    let tables = self.tables.lock();
    Ok(Self::newest_first(&tables, |order| order.user_profile_id == user_profile_id))
  }

  async fn orders_for_provider(&self, provider_id: Uuid, status: Option<OrderStatus>) -> EngineResult<Vec<Order>> {
    let tables = self.tables.lock();
    Ok(Self::newest_first(&tables, |order| {
      order.provider_id == provider_id && status.map_or(true, |s| order.status == s)
    }))
  }

  async fn mark_viewed(&self, order_id: Uuid) -> EngineResult<bool> {
    let mut tables = self.tables.lock();
    let order = tables
      .orders
      .get_mut(&order_id)
      .ok_or_else(|| EngineError::not_found("order", order_id))?;
    if order.viewed_by_provider {
      return Ok(false);
    }
    order.viewed_by_provider = true;
    Ok(true)
  }

  async fn mark_all_viewed(&self, provider_id: Uuid) -> EngineResult<u64> {
    let mut tables = self.tables.lock();
    let mut changed = 0;
    for order in tables.orders.values_mut() {
      if order.provider_id == provider_id && !order.viewed_by_provider {
        order.viewed_by_provider = true;
        changed += 1;
      }
    }
    Ok(changed)
  }

  async fn mark_reviewed(&self, order_id: Uuid) -> EngineResult<bool> {
    let mut tables = self.tables.lock();
    let order = tables
      .orders
      .get_mut(&order_id)
      .ok_or_else(|| EngineError::not_found("order", order_id))?;
    if order.is_reviewed {
      return Ok(false);
    }
    order.is_reviewed = true;
    Ok(true)
  }
}
