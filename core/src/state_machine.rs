// foodloop/src/state_machine.rs

//! Order status workflow.
//!
//! Legal moves live in one table, [`TRANSITIONS`]. Every change is planned
//! by a pure function over the locked order and its history, then written by
//! the store together with its audit entry (and, when entering CANCELLED
//! through a forward move, the stock restoration).

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::models::{Order, OrderStatus, StatusLogEntry};
use crate::store::{AppliedChange, OrderStore, StatusChange};

/// Current status -> statuses it may move to.
pub const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
  (OrderStatus::Pending, &[OrderStatus::Accepted, OrderStatus::Cancelled]),
  (OrderStatus::Accepted, &[OrderStatus::Preparing, OrderStatus::Cancelled]),
  (OrderStatus::Preparing, &[OrderStatus::ReadyForPickup, OrderStatus::Cancelled]),
  (OrderStatus::ReadyForPickup, &[OrderStatus::InTransit, OrderStatus::Cancelled]),
  (OrderStatus::InTransit, &[OrderStatus::Delivered, OrderStatus::Cancelled]),
  (OrderStatus::Delivered, &[OrderStatus::Cancelled]),
  (OrderStatus::Cancelled, &[OrderStatus::Pending, OrderStatus::Accepted]),
];

impl OrderStatus {
  pub fn allowed_next(self) -> &'static [OrderStatus] {
    TRANSITIONS
      .iter()
      .find(|(from, _)| *from == self)
      .map(|(_, to)| *to)
      .unwrap_or(&[])
  }

  pub fn can_transition_to(self, target: OrderStatus) -> bool {
    self.allowed_next().contains(&target)
  }
}

/// The most recent status in `history` (newest first) that differs from `current`.
pub fn prior_distinct_status(history: &[StatusLogEntry], current: OrderStatus) -> Option<OrderStatus> {
  history
    .iter()
    .map(|entry| entry.status)
    .find(|status| *status != current)
}

/// Plans a provider-driven forward transition.
pub fn plan_transition(
  order: &Order,
  actor_provider_id: Uuid,
  target: OrderStatus,
  notes: Option<String>,
  estimated_minutes: Option<i64>,
  now: DateTime<Utc>,
) -> EngineResult<StatusChange> {
  if order.provider_id != actor_provider_id {
    return Err(EngineError::NotOwner {
      order_id: order.id,
      actor_id: actor_provider_id,
    });
  }
  if !order.status.can_transition_to(target) {
    return Err(EngineError::InvalidTransition {
      order_id: order.id,
      current: order.status,
      attempted: target,
    });
  }

  let estimated_delivery = match (target, estimated_minutes) {
    (OrderStatus::Accepted, Some(minutes)) if minutes > 0 => Some(
      Duration::try_minutes(minutes)
        .and_then(|eta| now.checked_add_signed(eta))
        .ok_or_else(|| EngineError::validation(format!("estimated minutes out of range: {}", minutes)))?,
    ),
    _ => None,
  };

  Ok(StatusChange {
    status: target,
    notes: notes.unwrap_or_else(|| format!("Order status changed from {} to {}", order.status, target)),
    estimated_delivery,
    restore_inventory: target == OrderStatus::Cancelled,
  })
}

/// Plans a revert to the most recent distinct earlier status. Bypasses the
/// transition table and never restores stock.
pub fn plan_go_back(
  order: &Order,
  history: &[StatusLogEntry],
  actor_provider_id: Uuid,
  notes: Option<String>,
) -> EngineResult<StatusChange> {
  if order.provider_id != actor_provider_id {
    return Err(EngineError::NotOwner {
      order_id: order.id,
      actor_id: actor_provider_id,
    });
  }
  let prior = prior_distinct_status(history, order.status).ok_or(EngineError::NoPriorStatus { order_id: order.id })?;

  Ok(StatusChange {
    status: prior,
    notes: notes.unwrap_or_else(|| format!("Status reverted from {} to {}", order.status, prior)),
    estimated_delivery: None,
    restore_inventory: false,
  })
}

/// Plans a customer cancellation: only the order's own user, only while PENDING.
pub fn plan_customer_cancel(order: &Order, user_profile_id: Uuid) -> EngineResult<StatusChange> {
  if order.user_profile_id != user_profile_id {
    return Err(EngineError::NotOwner {
      order_id: order.id,
      actor_id: user_profile_id,
    });
  }
  if order.status != OrderStatus::Pending {
    return Err(EngineError::InvalidTransition {
      order_id: order.id,
      current: order.status,
      attempted: OrderStatus::Cancelled,
    });
  }
  Ok(StatusChange {
    status: OrderStatus::Cancelled,
    notes: "Order cancelled by customer".to_string(),
    estimated_delivery: None,
    restore_inventory: true,
  })
}

#[derive(Clone)]
pub struct OrderStateMachine {
  store: Arc<dyn OrderStore>,
  clock: Arc<dyn Clock>,
}

impl OrderStateMachine {
  pub fn new(store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>) -> Self {
    Self { store, clock }
  }

  #[instrument(name = "orders::apply_transition", skip(self, notes), err(Display))]
  pub async fn apply_transition(
    &self,
    order_id: Uuid,
    actor_provider_id: Uuid,
    target: OrderStatus,
    notes: Option<String>,
    estimated_minutes: Option<i64>,
  ) -> EngineResult<AppliedChange> {
    let now = self.clock.now();
    let applied = self
      .store
      .apply_status_change(
        order_id,
        now,
        Box::new(move |order: &Order, _history: &[StatusLogEntry]| {
          plan_transition(order, actor_provider_id, target, notes, estimated_minutes, now)
        }),
      )
      .await
      .map_err(log_rejection)?;
    info!(
      from = %applied.previous_status,
      to = %applied.order.status,
      restored_items = applied.restored.len(),
      "Order status changed."
    );
    Ok(applied)
  }

  #[instrument(name = "orders::go_back", skip(self, notes), err(Display))]
  pub async fn go_back(&self, order_id: Uuid, actor_provider_id: Uuid, notes: Option<String>) -> EngineResult<AppliedChange> {
    let applied = self
      .store
      .apply_status_change(
        order_id,
        self.clock.now(),
        Box::new(move |order: &Order, history: &[StatusLogEntry]| {
          plan_go_back(order, history, actor_provider_id, notes)
        }),
      )
      .await
      .map_err(log_rejection)?;
    info!(from = %applied.previous_status, to = %applied.order.status, "Order status reverted.");
    Ok(applied)
  }

  #[instrument(name = "orders::cancel_as_customer", skip(self), err(Display))]
  pub async fn cancel_as_customer(&self, order_id: Uuid, user_profile_id: Uuid) -> EngineResult<AppliedChange> {
    let applied = self
      .store
      .apply_status_change(
        order_id,
        self.clock.now(),
        Box::new(move |order: &Order, _history: &[StatusLogEntry]| plan_customer_cancel(order, user_profile_id)),
      )
      .await
      .map_err(log_rejection)?;
    info!(restored_items = applied.restored.len(), "Order cancelled by customer.");
    Ok(applied)
  }
}

impl std::fmt::Debug for OrderStateMachine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OrderStateMachine").finish_non_exhaustive()
  }
}

fn log_rejection(err: EngineError) -> EngineError {
  if err.is_client_error() {
    warn!(code = err.code(), error = %err, "Status change rejected.");
  }
  err
}
