// tests/checkout_tests.rs
mod common;

use common::*;
use foodloop::{EngineError, FoodItemStatus, OrderStatus, OrderStore};
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_single_provider_checkout_commits_everything() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let user = Uuid::new_v4();
  let soup = item(provider, 5, 1500);
  let h = Harness::with_items(vec![soup.clone()]);

  let placed = h.place(user, vec![line(&soup, 2)]).await;

  assert_eq!(placed.order.status, OrderStatus::Pending);
  assert_eq!(placed.order.provider_id, provider);
  assert_eq!(placed.order.user_profile_id, user);
  assert_eq!(placed.order.delivery_address, "12 Market Lane");
  assert_eq!(placed.order.total_amount, money(3000 + 299 + 150));
  assert_eq!(placed.line_items.len(), 1);
  assert_eq!(placed.line_items[0].price, money(1500));
  assert_eq!(placed.status_log.status, OrderStatus::Pending);
  assert_eq!(placed.status_log.notes.as_deref(), Some("Order placed by customer"));

  let stock = h.stock_of(soup.id).await;
  assert_eq!(stock.quantity, 3);
  assert_eq!(h.store.status_log_len(), 1);
}

#[tokio::test]
#[serial]
async fn test_line_prices_are_frozen_at_checkout() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 5, 1500);
  let h = Harness::with_items(vec![soup.clone()]);

  let placed = h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;

  let mut repriced = h.stock_of(soup.id).await;
  repriced.discounted_price = money(100);
  h.store.save_food_item(repriced).await.unwrap();

  let items = h.store.line_items(placed.order.id).await.unwrap();
  assert_eq!(items[0].price, money(1500));
}

#[tokio::test]
#[serial]
async fn test_checkout_charges_server_price_not_client_price() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 5, 1500);
  let h = Harness::with_items(vec![soup.clone()]);

  let mut cheeky = line(&soup, 2);
  cheeky.client_price = money(1);
  let placed = h.place(Uuid::new_v4(), vec![cheeky]).await;
  assert_eq!(placed.order.total_amount, money(3000 + 449));
}

#[tokio::test]
#[serial]
async fn test_one_provider_failing_does_not_block_the_other() {
  setup_tracing();
  let provider_a = Uuid::new_v4();
  let provider_b = Uuid::new_v4();
  let bagels = item(provider_a, 4, 300);
  let cake = item(provider_b, 0, 900);
  let h = Harness::with_items(vec![bagels.clone(), cake.clone()]);

  let outcome = h
    .engine
    .checkout()
    .checkout(request(Uuid::new_v4(), vec![line(&bagels, 2), line(&cake, 1)]))
    .await
    .unwrap();

  assert_eq!(outcome.orders.len(), 1);
  assert_eq!(outcome.orders[0].order.provider_id, provider_a);
  assert_eq!(outcome.failures.len(), 1);
  assert_eq!(outcome.failures[0].provider_id, provider_b);
  assert!(matches!(outcome.failures[0].error, EngineError::ItemUnavailable { .. }));

  assert_eq!(h.stock_of(bagels.id).await.quantity, 2);
  assert_eq!(h.stock_of(cake.id).await.quantity, 0);
  assert_eq!(h.store.order_count(), 1);
}

#[tokio::test]
#[serial]
async fn test_insufficient_stock_rejects_the_whole_group() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let soup = item(provider, 5, 1500);
  let bread = item(provider, 1, 400);
  let h = Harness::with_items(vec![soup.clone(), bread.clone()]);

  let outcome = h
    .engine
    .checkout()
    .checkout(request(Uuid::new_v4(), vec![line(&soup, 2), line(&bread, 2)]))
    .await
    .unwrap();

  assert!(outcome.orders.is_empty());
  assert!(matches!(
    outcome.failures[0].error,
    EngineError::InsufficientStock {
      requested: 2,
      available: 1,
      ..
    }
  ));
  // Nothing from the group was decremented.
  assert_eq!(h.stock_of(soup.id).await.quantity, 5);
  assert_eq!(h.stock_of(bread.id).await.quantity, 1);
  assert_eq!(h.store.status_log_len(), 0);
}

#[tokio::test]
#[serial]
async fn test_duplicate_lines_are_checked_against_their_sum() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 3, 1500);
  let h = Harness::with_items(vec![soup.clone()]);

  let outcome = h
    .engine
    .checkout()
    .checkout(request(Uuid::new_v4(), vec![line(&soup, 2), line(&soup, 2)]))
    .await
    .unwrap();
  assert!(matches!(
    outcome.failures[0].error,
    EngineError::InsufficientStock {
      requested: 4,
      available: 3,
      ..
    }
  ));
  assert_eq!(h.stock_of(soup.id).await.quantity, 3);
}

#[tokio::test]
#[serial]
async fn test_duplicate_lines_that_overflow_are_rejected() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 3, 1500);
  let h = Harness::with_items(vec![soup.clone()]);

  let outcome = h
    .engine
    .checkout()
    .checkout(request(Uuid::new_v4(), vec![line(&soup, i32::MAX), line(&soup, 1)]))
    .await
    .unwrap();
  assert!(outcome.orders.is_empty());
  assert!(matches!(outcome.failures[0].error, EngineError::Validation(_)));
  assert_eq!(outcome.failures[0].code, "validation_error");
  assert_eq!(h.stock_of(soup.id).await.quantity, 3);
  assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn test_buying_the_last_units_marks_item_sold() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 2, 1500);
  let h = Harness::with_items(vec![soup.clone()]);

  h.place(Uuid::new_v4(), vec![line(&soup, 2)]).await;
  let stock = h.stock_of(soup.id).await;
  assert_eq!(stock.quantity, 0);
  assert_eq!(stock.status, FoodItemStatus::Sold);
}

#[tokio::test]
#[serial]
async fn test_request_level_validation() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 2, 1500);
  let h = Harness::with_items(vec![soup.clone()]);
  let user = Uuid::new_v4();

  let empty = request(user, vec![]);
  assert!(matches!(
    h.engine.checkout().checkout(empty).await,
    Err(EngineError::Validation(_))
  ));

  let mut no_address = request(user, vec![line(&soup, 1)]);
  no_address.delivery.address = "   ".to_string();
  assert!(matches!(
    h.engine.checkout().checkout(no_address).await,
    Err(EngineError::Validation(_))
  ));

  let mut orphan = line(&soup, 1);
  orphan.provider_id = None;
  assert!(matches!(
    h.engine.checkout().checkout(request(user, vec![orphan])).await,
    Err(EngineError::Validation(_))
  ));

  assert_eq!(h.stock_of(soup.id).await.quantity, 2);
}

#[tokio::test]
#[serial]
async fn test_line_attributed_to_wrong_provider_fails_its_group() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 2, 1500);
  let h = Harness::with_items(vec![soup.clone()]);

  let mut misfiled = line(&soup, 1);
  misfiled.provider_id = Some(Uuid::new_v4());
  let outcome = h
    .engine
    .checkout()
    .checkout(request(Uuid::new_v4(), vec![misfiled]))
    .await
    .unwrap();
  assert!(matches!(outcome.failures[0].error, EngineError::Validation(_)));
  assert_eq!(h.stock_of(soup.id).await.quantity, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_checkouts_for_the_last_units() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 3, 1500);
  let h = Arc::new(Harness::with_items(vec![soup.clone()]));

  let first = {
    let h = Arc::clone(&h);
    let lines = vec![line(&soup, 3)];
    tokio::spawn(async move { h.engine.checkout().checkout(request(Uuid::new_v4(), lines)).await })
  };
  let second = {
    let h = Arc::clone(&h);
    let lines = vec![line(&soup, 3)];
    tokio::spawn(async move { h.engine.checkout().checkout(request(Uuid::new_v4(), lines)).await })
  };

  let outcomes = [first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];
  let placed: usize = outcomes.iter().map(|o| o.orders.len()).sum();
  assert_eq!(placed, 1);

  let loser = outcomes.iter().find(|o| o.orders.is_empty()).unwrap();
  assert!(matches!(
    loser.failures[0].error,
    EngineError::InsufficientStock { .. } | EngineError::ItemUnavailable { .. }
  ));
  assert_eq!(h.stock_of(soup.id).await.quantity, 0);
}

#[tokio::test]
#[serial]
async fn test_validate_then_checkout_then_second_cart_is_short() {
  setup_tracing();
  let soup = item(Uuid::new_v4(), 5, 1000);
  let h = Harness::with_items(vec![soup.clone()]);

  let report = h.engine.validator().validate(&[line(&soup, 3)]).await.unwrap();
  assert!(report.valid);

  let placed = h.place(Uuid::new_v4(), vec![line(&soup, 3)]).await;
  assert_eq!(h.stock_of(soup.id).await.quantity, 2);
  assert_eq!(placed.line_items[0].quantity, 3);
  assert_eq!(placed.line_items[0].price, money(1000));
  assert_eq!(placed.order.total_amount, money(3000 + 299 + 150));

  let outcome = h
    .engine
    .checkout()
    .checkout(request(Uuid::new_v4(), vec![line(&soup, 3)]))
    .await
    .unwrap();
  assert!(outcome.orders.is_empty());
  assert!(matches!(
    outcome.failures[0].error,
    EngineError::InsufficientStock {
      requested: 3,
      available: 2,
      ..
    }
  ));
  assert_eq!(h.stock_of(soup.id).await.quantity, 2);
}
