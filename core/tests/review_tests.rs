// tests/review_tests.rs
mod common;

use async_trait::async_trait;
use common::*;
use foodloop::{Engine, EngineError, ManualClock, MemoryStore, OrderStatus, RatingHook};
use parking_lot::Mutex;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

#[derive(Default)]
struct RecordingHook {
  providers: Mutex<Vec<Uuid>>,
  fail: bool,
}

#[async_trait]
impl RatingHook for RecordingHook {
  async fn recompute_provider_rating(&self, provider_id: Uuid) -> anyhow::Result<()> {
    self.providers.lock().push(provider_id);
    if self.fail {
      anyhow::bail!("rating service unavailable");
    }
    Ok(())
  }
}

async fn delivered_order(engine: &Engine, provider: Uuid, user: Uuid, soup: &foodloop::FoodItem) -> Uuid {
  let outcome = engine.checkout().checkout(request(user, vec![line(soup, 1)])).await.unwrap();
  let order_id = outcome.orders[0].order.id;
  for step in [
    OrderStatus::Accepted,
    OrderStatus::Preparing,
    OrderStatus::ReadyForPickup,
    OrderStatus::InTransit,
    OrderStatus::Delivered,
  ] {
    engine.orders().apply_transition(order_id, provider, step, None, None).await.unwrap();
  }
  order_id
}

fn engine_with_hook(hook: Arc<RecordingHook>, items: Vec<foodloop::FoodItem>) -> Engine {
  Engine::builder(Arc::new(MemoryStore::with_items(items)))
    .clock(Arc::new(ManualClock::new(t0())))
    .rating_hook(hook)
    .build()
    .unwrap()
}

async fn wait_for_hook(hook: &RecordingHook) {
  for _ in 0..50 {
    if !hook.providers.lock().is_empty() {
      return;
    }
    tokio::time::sleep(StdDuration::from_millis(10)).await;
  }
}

#[tokio::test]
#[serial]
async fn test_delivered_order_can_be_reviewed_once() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let user = Uuid::new_v4();
  let soup = item(provider, 5, 1000);
  let hook = Arc::new(RecordingHook::default());
  let engine = engine_with_hook(hook.clone(), vec![soup.clone()]);
  let order_id = delivered_order(&engine, provider, user, &soup).await;

  let order = engine.reviews().mark_reviewed(order_id, user).await.unwrap();
  assert!(order.is_reviewed);

  wait_for_hook(&hook).await;
  assert_eq!(*hook.providers.lock(), vec![provider]);

  let again = engine.reviews().mark_reviewed(order_id, user).await.unwrap_err();
  assert!(matches!(again, EngineError::Validation(_)));
}

#[tokio::test]
#[serial]
async fn test_undelivered_order_cannot_be_reviewed() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let user = Uuid::new_v4();
  let soup = item(provider, 5, 1000);
  let h = Harness::with_items(vec![soup.clone()]);
  let placed = h.place(user, vec![line(&soup, 1)]).await;

  let err = h.engine.reviews().mark_reviewed(placed.order.id, user).await.unwrap_err();
  assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
#[serial]
async fn test_only_the_ordering_user_may_review() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let user = Uuid::new_v4();
  let soup = item(provider, 5, 1000);
  let hook = Arc::new(RecordingHook::default());
  let engine = engine_with_hook(hook, vec![soup.clone()]);
  let order_id = delivered_order(&engine, provider, user, &soup).await;

  let err = engine.reviews().mark_reviewed(order_id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, EngineError::NotOwner { .. }));
}

#[tokio::test]
#[serial]
async fn test_failing_rating_hook_does_not_fail_the_review() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let user = Uuid::new_v4();
  let soup = item(provider, 5, 1000);
  let hook = Arc::new(RecordingHook {
    providers: Mutex::new(Vec::new()),
    fail: true,
  });
  let engine = engine_with_hook(hook.clone(), vec![soup.clone()]);
  let order_id = delivered_order(&engine, provider, user, &soup).await;

  assert!(engine.reviews().mark_reviewed(order_id, user).await.is_ok());
  wait_for_hook(&hook).await;
  assert_eq!(hook.providers.lock().len(), 1);
}
