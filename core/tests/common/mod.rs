// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every fixture

use chrono::{DateTime, Duration, TimeZone, Utc};
use foodloop::{
  CartLine, CheckoutRequest, DeliveryInfo, Engine, FoodItem, FoodItemStatus, ManualClock, MemoryStore, PlacedOrder,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Fixed starting time so expiry checks are deterministic ---
pub fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Money helper: `money(1050)` is 10.50.
pub fn money(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

pub fn item(provider_id: Uuid, quantity: i32, discounted_cents: i64) -> FoodItem {
  FoodItem {
    id: Uuid::new_v4(),
    name: "Surplus bread box".to_string(),
    price: money(discounted_cents * 2),
    discounted_price: money(discounted_cents),
    quantity,
    status: FoodItemStatus::Active,
    expires_at: t0() + Duration::hours(6),
    provider_id,
    category_id: None,
  }
}

pub fn line(item: &FoodItem, quantity: i32) -> CartLine {
  CartLine {
    item_id: item.id,
    provider_id: Some(item.provider_id),
    requested_quantity: quantity,
    client_price: item.discounted_price,
  }
}

pub fn request(user_profile_id: Uuid, lines: Vec<CartLine>) -> CheckoutRequest {
  CheckoutRequest {
    user_profile_id,
    lines,
    delivery: DeliveryInfo {
      address: "12 Market Lane".to_string(),
      notes: Some("Ring twice".to_string()),
    },
    payment_method: "CARD".to_string(),
  }
}

// --- Harness: engine + the concrete store and clock behind it ---
pub struct Harness {
  pub engine: Engine,
  pub store: Arc<MemoryStore>,
  pub clock: Arc<ManualClock>,
}

impl Harness {
  pub fn with_items(items: Vec<FoodItem>) -> Self {
    let store = Arc::new(MemoryStore::with_items(items));
    let clock = Arc::new(ManualClock::new(t0()));
    let engine = Engine::builder(store.clone())
      .clock(clock.clone())
      .build()
      .expect("engine should build");
    Self { engine, store, clock }
  }

  pub async fn stock_of(&self, item_id: Uuid) -> FoodItem {
    use foodloop::OrderStore;
    self.store.food_item(item_id).await.unwrap().expect("item exists")
  }

  /// Places a single-provider order and returns it.
  pub async fn place(&self, user_profile_id: Uuid, lines: Vec<CartLine>) -> PlacedOrder {
    let mut outcome = self.engine.checkout().checkout(request(user_profile_id, lines)).await.unwrap();
    assert!(outcome.failures.is_empty(), "unexpected failures: {:?}", outcome.failures);
    outcome.orders.remove(0)
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
