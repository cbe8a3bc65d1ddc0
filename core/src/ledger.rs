// foodloop/src/ledger.rs

//! Inventory ledger: availability reads and the guarded stock mutations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::models::FoodItem;
use crate::store::{OrderStore, RestoredStock};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
  pub item_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
  pub discounted_price: Decimal,
  pub active: bool,
}

impl Availability {
  pub fn of(item: &FoodItem, now: DateTime<Utc>) -> Self {
    Self {
      item_id: item.id,
      quantity: item.quantity,
      price: item.price,
      discounted_price: item.discounted_price,
      active: item.is_available_at(now),
    }
  }
}

#[derive(Clone)]
pub struct InventoryLedger {
  store: Arc<dyn OrderStore>,
  clock: Arc<dyn Clock>,
}

impl InventoryLedger {
  pub fn new(store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>) -> Self {
    Self { store, clock }
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.clock.now()
  }

  /// Read-only availability of one item.
  pub async fn check_availability(&self, item_id: Uuid) -> EngineResult<Availability> {
    let item = self
      .store
      .food_item(item_id)
      .await?
      .ok_or_else(|| EngineError::not_found("food item", item_id))?;
    Ok(Availability::of(&item, self.clock.now()))
  }

  /// Read-only snapshot of several items, whatever their availability.
  pub async fn snapshot(&self, item_ids: &[Uuid]) -> EngineResult<Vec<FoodItem>> {
    self.store.food_items(item_ids).await
  }

  /// The subset of `item_ids` that is currently available.
  pub async fn live_items(&self, item_ids: &[Uuid]) -> EngineResult<Vec<FoodItem>> {
    let now = self.clock.now();
    let items = self.store.food_items(item_ids).await?;
    Ok(items.into_iter().filter(|item| item.is_available_at(now)).collect())
  }

  #[instrument(name = "ledger::decrement", skip(self), err(Display))]
  pub async fn decrement(&self, item_id: Uuid, amount: i32) -> EngineResult<FoodItem> {
    let item = self.store.decrement_stock(item_id, amount).await?;
    debug!(remaining = item.quantity, status = %item.status, "Stock decremented.");
    Ok(item)
  }

  #[instrument(name = "ledger::increment", skip(self), err(Display))]
  pub async fn increment(&self, item_id: Uuid, amount: i32) -> EngineResult<RestoredStock> {
    let restored = self.store.increment_stock(item_id, amount, self.clock.now()).await?;
    if restored.relisted {
      info!(%item_id, "Sold-out item re-listed after stock came back.");
    }
    Ok(restored)
  }

  /// Flips expired ACTIVE items to EXPIRED. Idempotent.
  pub async fn expire_stale(&self) -> EngineResult<u64> {
    let expired = self.store.expire_stale(self.clock.now()).await?;
    if expired > 0 {
      info!(expired, "Expired stale food items.");
    }
    Ok(expired)
  }
}

impl std::fmt::Debug for InventoryLedger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InventoryLedger").finish_non_exhaustive()
  }
}
