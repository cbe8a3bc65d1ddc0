// foodloop/src/checkout.rs

//! Turns a multi-provider cart into one order per provider.
//!
//! Each provider group runs through its own pipeline:
//! `load_live_items -> verify_lines -> price_order -> commit_order`.
//! The last step commits order, line items, first status log entry and
//! every stock decrement as one unit. Groups are independent: a failed
//! group is reported and the others still commit.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult, WorkflowError};
use crate::fees::PriceBreakdown;
use crate::ledger::InventoryLedger;
use crate::models::{requested_per_item, CartLine, DeliveryInfo, FoodItem};
use crate::store::{LineDraft, OrderDraft, OrderStore, PlacedOrder};
use crate::workflow::{ContextData, Pipeline};

pub const INITIAL_STATUS_NOTE: &str = "Order placed by customer";

const CHECKOUT_STEPS: &[&str] = &["load_live_items", "verify_lines", "price_order", "commit_order"];

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
  pub user_profile_id: Uuid,
  pub lines: Vec<CartLine>,
  pub delivery: DeliveryInfo,
  pub payment_method: String,
}

/// Why one provider group did not produce an order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFailure {
  pub provider_id: Uuid,
  pub code: &'static str,
  pub message: String,
  #[serde(skip)]
  pub error: EngineError,
}

impl ProviderFailure {
  fn new(provider_id: Uuid, error: EngineError) -> Self {
    Self {
      provider_id,
      code: error.code(),
      message: error.to_string(),
      error,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
  pub orders: Vec<PlacedOrder>,
  pub failures: Vec<ProviderFailure>,
}

/// Per-provider pipeline context.
struct ProviderCheckoutCtx {
  ledger: InventoryLedger,
  store: Arc<dyn OrderStore>,
  now: DateTime<Utc>,
  user_profile_id: Uuid,
  provider_id: Uuid,
  lines: Vec<CartLine>,
  delivery: DeliveryInfo,
  payment_method: String,
  live_items: HashMap<Uuid, FoodItem>,
  pricing: Option<PriceBreakdown>,
  placed: Option<PlacedOrder>,
}

pub struct CheckoutTransactor {
  ledger: InventoryLedger,
  store: Arc<dyn OrderStore>,
  clock: Arc<dyn Clock>,
  pipeline: Pipeline<ProviderCheckoutCtx, EngineError>,
}

impl CheckoutTransactor {
  pub fn new(ledger: InventoryLedger, store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>) -> EngineResult<Self> {
    Ok(Self {
      ledger,
      store,
      clock,
      pipeline: build_provider_pipeline()?,
    })
  }

  #[instrument(
    name = "checkout::run",
    skip_all,
    fields(user_profile_id = %request.user_profile_id, lines = request.lines.len())
  )]
  pub async fn checkout(&self, request: CheckoutRequest) -> EngineResult<CheckoutOutcome> {
    validate_request(&request)?;
    let groups = partition_by_provider(&request.lines)?;

    self.ledger.expire_stale().await?;

    let mut outcome = CheckoutOutcome {
      orders: Vec::new(),
      failures: Vec::new(),
    };
    for (provider_id, lines) in groups {
      match self.checkout_provider(&request, provider_id, lines).await {
        Ok(placed) => outcome.orders.push(placed),
        Err(error) => {
          warn!(%provider_id, error = %error, "Provider group failed at checkout.");
          outcome.failures.push(ProviderFailure::new(provider_id, error));
        }
      }
    }
    Ok(outcome)
  }

  async fn checkout_provider(
    &self,
    request: &CheckoutRequest,
    provider_id: Uuid,
    lines: Vec<CartLine>,
  ) -> EngineResult<PlacedOrder> {
    let ctx_data = ContextData::new(ProviderCheckoutCtx {
      ledger: self.ledger.clone(),
      store: Arc::clone(&self.store),
      now: self.clock.now(),
      user_profile_id: request.user_profile_id,
      provider_id,
      lines,
      delivery: request.delivery.clone(),
      payment_method: request.payment_method.clone(),
      live_items: HashMap::new(),
      pricing: None,
      placed: None,
    });

    self.pipeline.run(ctx_data.clone()).await?;
    let placed = ctx_data.write().placed.take();
    placed.ok_or_else(|| {
      WorkflowError::MissingOutput {
        step_name: "commit_order".to_string(),
        missing: "a placed order",
      }
      .into()
    })
  }
}

impl std::fmt::Debug for CheckoutTransactor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CheckoutTransactor")
      .field("steps", &self.pipeline.step_names())
      .finish_non_exhaustive()
  }
}

fn build_provider_pipeline() -> Result<Pipeline<ProviderCheckoutCtx, EngineError>, WorkflowError> {
  let mut p = Pipeline::<ProviderCheckoutCtx, EngineError>::new(CHECKOUT_STEPS);
  p.on_step("load_live_items", load_live_items)?;
  p.on_step("verify_lines", verify_lines)?;
  p.on_step("price_order", price_order)?;
  p.on_step("commit_order", commit_order)?;
  p.after_step("commit_order", log_placement)?;
  Ok(p)
}

fn validate_request(request: &CheckoutRequest) -> EngineResult<()> {
  if request.lines.is_empty() {
    return Err(EngineError::validation("cart is empty"));
  }
  if request.delivery.address.trim().is_empty() {
    return Err(EngineError::validation("delivery address is required"));
  }
  if request.payment_method.trim().is_empty() {
    return Err(EngineError::validation("payment method is required"));
  }
  if let Some(bad) = request.lines.iter().find(|l| l.requested_quantity <= 0) {
    return Err(EngineError::validation(format!(
      "requested quantity for item {} must be positive",
      bad.item_id
    )));
  }
  Ok(())
}

/// Groups lines by provider, keeping the order in which providers first appear.
fn partition_by_provider(lines: &[CartLine]) -> EngineResult<Vec<(Uuid, Vec<CartLine>)>> {
  let mut groups: Vec<(Uuid, Vec<CartLine>)> = Vec::new();
  for line in lines {
    let provider_id = line
      .provider_id
      .ok_or_else(|| EngineError::validation(format!("cart line for item {} has no provider", line.item_id)))?;
    match groups.iter_mut().find(|(id, _)| *id == provider_id) {
      Some((_, group)) => group.push(line.clone()),
      None => groups.push((provider_id, vec![line.clone()])),
    }
  }
  Ok(groups)
}

async fn load_live_items(ctx: ContextData<ProviderCheckoutCtx>) -> EngineResult<()> {
  let (ledger, item_ids) = {
    let guard = ctx.read();
    let ids: Vec<Uuid> = guard.lines.iter().map(|l| l.item_id).collect();
    (guard.ledger.clone(), ids)
  };

  let live = ledger.live_items(&item_ids).await?;
  ctx.write().live_items = live.into_iter().map(|item| (item.id, item)).collect();
  Ok(())
}

async fn verify_lines(ctx: ContextData<ProviderCheckoutCtx>) -> EngineResult<()> {
  let guard = ctx.read();

  for line in &guard.lines {
    let item = guard
      .live_items
      .get(&line.item_id)
      .ok_or(EngineError::ItemUnavailable { item_id: line.item_id })?;
    if item.provider_id != guard.provider_id {
      return Err(EngineError::validation(format!(
        "item {} is not sold by provider {}",
        line.item_id, guard.provider_id
      )));
    }
  }

  // The same item may appear on several lines; stock is checked against the sum.
  for (item_id, total) in requested_per_item(&guard.lines)? {
    let available = guard.live_items.get(&item_id).map_or(0, |item| item.quantity);
    if total > available {
      return Err(EngineError::InsufficientStock {
        item_id,
        requested: total,
        available,
      });
    }
  }
  Ok(())
}

async fn price_order(ctx: ContextData<ProviderCheckoutCtx>) -> EngineResult<()> {
  let mut guard = ctx.write();
  let mut priced = Vec::with_capacity(guard.lines.len());
  for line in &guard.lines {
    let item = guard
      .live_items
      .get(&line.item_id)
      .ok_or(EngineError::ItemUnavailable { item_id: line.item_id })?;
    priced.push((item.discounted_price, line.requested_quantity));
  }
  guard.pricing = Some(PriceBreakdown::from_lines(priced));
  Ok(())
}

async fn commit_order(ctx: ContextData<ProviderCheckoutCtx>) -> EngineResult<()> {
  let (store, draft) = {
    let guard = ctx.read();
    let pricing = guard.pricing.ok_or_else(|| WorkflowError::MissingOutput {
      step_name: "price_order".to_string(),
      missing: "order pricing",
    })?;
    let mut lines = Vec::with_capacity(guard.lines.len());
    for line in &guard.lines {
      let item = guard
        .live_items
        .get(&line.item_id)
        .ok_or(EngineError::ItemUnavailable { item_id: line.item_id })?;
      lines.push(LineDraft {
        food_item_id: line.item_id,
        quantity: line.requested_quantity,
        price: item.discounted_price,
      });
    }
    let draft = OrderDraft {
      order_id: Uuid::new_v4(),
      user_profile_id: guard.user_profile_id,
      provider_id: guard.provider_id,
      total_amount: pricing.total,
      delivery_address: guard.delivery.address.trim().to_string(),
      delivery_notes: guard.delivery.notes.clone(),
      payment_method: guard.payment_method.trim().to_string(),
      initial_note: INITIAL_STATUS_NOTE.to_string(),
      created_at: guard.now,
      lines,
    };
    (Arc::clone(&guard.store), draft)
  };

  let placed = store.commit_checkout(draft).await?;
  ctx.write().placed = Some(placed);
  Ok(())
}

async fn log_placement(ctx: ContextData<ProviderCheckoutCtx>) -> EngineResult<()> {
  let guard = ctx.read();
  if let Some(placed) = &guard.placed {
    info!(
      order_id = %placed.order.id,
      provider_id = %guard.provider_id,
      lines = placed.line_items.len(),
      total = %placed.order.total_amount,
      "Order placed."
    );
  }
  Ok(())
}
