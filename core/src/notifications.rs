// foodloop/src/notifications.rs

//! Provider notifications, projected from orders. No storage of their own:
//! an order is a notification and `viewed_by_provider` is its read flag.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Order, OrderStatus};
use crate::store::OrderStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderNotification {
  pub order_id: Uuid,
  pub title: String,
  pub message: String,
  pub viewed: bool,
  pub status: OrderStatus,
  pub item_count: i32,
  pub total_amount: Decimal,
  pub created_at: DateTime<Utc>,
}

/// First eight hex digits of the order id, as shown to providers.
pub fn short_order_ref(order_id: Uuid) -> String {
  order_id.simple().to_string().chars().take(8).collect()
}

impl ProviderNotification {
  pub fn from_order(order: &Order, item_count: i32) -> Self {
    let reference = short_order_ref(order.id);
    let noun = if item_count == 1 { "item" } else { "items" };
    Self {
      order_id: order.id,
      title: format!("New order #{}", reference),
      message: format!(
        "Order #{} with {} {} is {}",
        reference, item_count, noun, order.status
      ),
      viewed: order.viewed_by_provider,
      status: order.status,
      item_count,
      total_amount: order.total_amount,
      created_at: order.created_at,
    }
  }
}

#[derive(Clone)]
pub struct NotificationRelay {
  store: Arc<dyn OrderStore>,
}

impl NotificationRelay {
  pub fn new(store: Arc<dyn OrderStore>) -> Self {
    Self { store }
  }

  /// Newest first.
  #[instrument(name = "notifications::list", skip(self))]
  pub async fn list_notifications(&self, provider_id: Uuid) -> EngineResult<Vec<ProviderNotification>> {
    let orders = self.store.orders_for_provider(provider_id, None).await?;
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let mut item_counts: HashMap<Uuid, i32> = HashMap::new();
    for line in self.store.line_items_for_orders(&order_ids).await? {
      *item_counts.entry(line.order_id).or_default() += line.quantity;
    }

    Ok(
      orders
        .iter()
        .map(|order| ProviderNotification::from_order(order, item_counts.get(&order.id).copied().unwrap_or(0)))
        .collect(),
    )
  }

  pub async fn unviewed_count(&self, provider_id: Uuid) -> EngineResult<usize> {
    let orders = self.store.orders_for_provider(provider_id, None).await?;
    Ok(orders.iter().filter(|o| !o.viewed_by_provider).count())
  }

  /// Returns false if the order had already been viewed. Only the order's
  /// own provider may flip the flag.
  pub async fn mark_viewed(&self, order_id: Uuid, provider_id: Uuid) -> EngineResult<bool> {
    // An order's provider never changes, so checking before the write is enough.
    let order = self
      .store
      .order(order_id)
      .await?
      .ok_or_else(|| EngineError::not_found("order", order_id))?;
    if order.provider_id != provider_id {
      return Err(EngineError::NotOwner {
        order_id,
        actor_id: provider_id,
      });
    }
    let changed = self.store.mark_viewed(order_id).await?;
    debug!(%order_id, %provider_id, changed, "Notification marked viewed.");
    Ok(changed)
  }

  /// Returns the number of notifications that flipped to viewed.
  pub async fn mark_all_viewed(&self, provider_id: Uuid) -> EngineResult<u64> {
    let changed = self.store.mark_all_viewed(provider_id).await?;
    debug!(%provider_id, changed, "All notifications marked viewed.");
    Ok(changed)
  }
}

impl std::fmt::Debug for NotificationRelay {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NotificationRelay").finish_non_exhaustive()
  }
}
