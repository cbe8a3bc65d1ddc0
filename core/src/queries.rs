// foodloop/src/queries.rs

//! Order read paths. Totals are always rebuilt through `fees`, so a listing
//! shows the same numbers checkout charged.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::fees::PriceBreakdown;
use crate::ledger::InventoryLedger;
use crate::models::{Order, OrderLineItem, OrderStatus, StatusLogEntry};
use crate::store::OrderStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
  pub order: Order,
  pub items: Vec<OrderLineItem>,
  pub pricing: PriceBreakdown,
  /// Newest first. Empty in list views.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub history: Vec<StatusLogEntry>,
}

impl OrderView {
  fn new(order: Order, items: Vec<OrderLineItem>, history: Vec<StatusLogEntry>) -> Self {
    let pricing = PriceBreakdown::from_lines(items.iter().map(|line| (line.price, line.quantity)));
    Self {
      order,
      items,
      pricing,
      history,
    }
  }
}

/// Who is reading an order: the customer who placed it or the provider fulfilling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderViewer {
  User(Uuid),
  Provider(Uuid),
}

impl OrderViewer {
  pub fn id(self) -> Uuid {
    match self {
      OrderViewer::User(id) | OrderViewer::Provider(id) => id,
    }
  }

  pub fn may_read(self, order: &Order) -> bool {
    match self {
      OrderViewer::User(id) => order.user_profile_id == id,
      OrderViewer::Provider(id) => order.provider_id == id,
    }
  }
}

#[derive(Clone)]
pub struct OrderQueries {
  store: Arc<dyn OrderStore>,
  ledger: InventoryLedger,
}

impl OrderQueries {
  pub fn new(store: Arc<dyn OrderStore>, ledger: InventoryLedger) -> Self {
    Self { store, ledger }
  }

  /// `NotOwner` unless `viewer` placed or fulfils the order.
  pub async fn order_details(&self, order_id: Uuid, viewer: OrderViewer) -> EngineResult<OrderView> {
    self.ledger.expire_stale().await?;
    let order = self.readable_order(order_id, viewer).await?;
    let items = self.store.line_items(order_id).await?;
    let history = self.store.status_history(order_id, None).await?;
    Ok(OrderView::new(order, items, history))
  }

  pub async fn orders_for_user(&self, user_profile_id: Uuid) -> EngineResult<Vec<OrderView>> {
    self.ledger.expire_stale().await?;
    let orders = self.store.orders_for_user(user_profile_id).await?;
    self.with_items(orders).await
  }

  pub async fn orders_for_provider(
    &self,
    provider_id: Uuid,
    status: Option<OrderStatus>,
  ) -> EngineResult<Vec<OrderView>> {
    self.ledger.expire_stale().await?;
    let orders = self.store.orders_for_provider(provider_id, status).await?;
    self.with_items(orders).await
  }

  /// The `limit` most recent log entries, newest first. `NotFound` for unknown
  /// orders, `NotOwner` for orders `viewer` has no part in.
  pub async fn status_history(
    &self,
    order_id: Uuid,
    viewer: OrderViewer,
    limit: Option<usize>,
  ) -> EngineResult<Vec<StatusLogEntry>> {
    self.readable_order(order_id, viewer).await?;
    self.store.status_history(order_id, limit).await
  }

  async fn readable_order(&self, order_id: Uuid, viewer: OrderViewer) -> EngineResult<Order> {
    let order = self
      .store
      .order(order_id)
      .await?
      .ok_or_else(|| EngineError::not_found("order", order_id))?;
    if !viewer.may_read(&order) {
      return Err(EngineError::NotOwner {
        order_id,
        actor_id: viewer.id(),
      });
    }
    Ok(order)
  }

  async fn with_items(&self, orders: Vec<Order>) -> EngineResult<Vec<OrderView>> {
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<Uuid, Vec<OrderLineItem>> = HashMap::new();
    for line in self.store.line_items_for_orders(&ids).await? {
      by_order.entry(line.order_id).or_default().push(line);
    }
    Ok(
      orders
        .into_iter()
        .map(|order| {
          let items = by_order.remove(&order.id).unwrap_or_default();
          OrderView::new(order, items, Vec::new())
        })
        .collect(),
    )
  }
}

impl std::fmt::Debug for OrderQueries {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OrderQueries").finish_non_exhaustive()
  }
}
