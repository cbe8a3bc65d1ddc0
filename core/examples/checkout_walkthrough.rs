// foodloop/examples/checkout_walkthrough.rs

//! Validates a two-provider cart, checks it out, and walks one order
//! through its lifecycle against the in-memory store.

use chrono::{Duration, Utc};
use foodloop::{
  CartLine, CheckoutRequest, DeliveryInfo, Engine, EngineError, FoodItem, FoodItemStatus, MemoryStore, OrderStatus,
  OrderViewer,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

fn listing(name: &str, provider_id: Uuid, quantity: i32, cents: i64) -> FoodItem {
  FoodItem {
    id: Uuid::new_v4(),
    name: name.to_string(),
    price: Decimal::new(cents * 2, 2),
    discounted_price: Decimal::new(cents, 2),
    quantity,
    status: FoodItemStatus::Active,
    expires_at: Utc::now() + Duration::hours(4),
    provider_id,
    category_id: None,
  }
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let bakery = Uuid::new_v4();
  let deli = Uuid::new_v4();
  let croissants = listing("Day-old croissants", bakery, 6, 250);
  let salad = listing("Salad bowl", deli, 0, 600);

  let engine = Engine::new(Arc::new(MemoryStore::with_items([croissants.clone(), salad.clone()])))?;

  let cart: Vec<CartLine> = [(&croissants, 4), (&salad, 1)]
    .into_iter()
    .map(|(item, qty)| CartLine {
      item_id: item.id,
      provider_id: Some(item.provider_id),
      requested_quantity: qty,
      client_price: item.discounted_price,
    })
    .collect();

  let report = engine.validator().validate(&cart).await?;
  for line in &report.lines {
    info!(item = %line.item_id, valid = line.valid, reason = ?line.reason, "Cart line checked.");
  }

  let outcome = engine
    .checkout()
    .checkout(CheckoutRequest {
      user_profile_id: Uuid::new_v4(),
      lines: cart,
      delivery: DeliveryInfo {
        address: "7 Canal Street".to_string(),
        notes: None,
      },
      payment_method: "CARD".to_string(),
    })
    .await?;
  for failure in &outcome.failures {
    warn!(provider = %failure.provider_id, code = failure.code, "{}", failure.message);
  }

  let Some(placed) = outcome.orders.first() else {
    warn!("Nothing was ordered.");
    return Ok(());
  };
  info!(order = %placed.order.id, total = %placed.order.total_amount, "Order placed.");

  let orders = engine.orders();
  orders
    .apply_transition(placed.order.id, bakery, OrderStatus::Accepted, None, Some(20))
    .await?;
  orders
    .apply_transition(placed.order.id, bakery, OrderStatus::Preparing, None, None)
    .await?;
  orders.go_back(placed.order.id, bakery, Some("Still waiting on the oven".into())).await?;

  for entry in engine
    .queries()
    .status_history(placed.order.id, OrderViewer::Provider(bakery), None)
    .await? {
    info!(status = %entry.status, notes = ?entry.notes, "History entry.");
  }
  Ok(())
}
