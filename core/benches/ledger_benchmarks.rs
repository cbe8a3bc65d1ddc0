use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use foodloop::{
  CartLine, CheckoutRequest, DeliveryInfo, Engine, FoodItem, FoodItemStatus, MemoryStore, OrderStatus,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::runtime::Runtime;
use uuid::Uuid;

// --- Fixtures ---
fn bench_item(provider_id: Uuid, quantity: i32) -> FoodItem {
  FoodItem {
    id: Uuid::new_v4(),
    name: "Bench loaf".to_string(),
    price: Decimal::new(800, 2),
    discounted_price: Decimal::new(400, 2),
    quantity,
    status: FoodItemStatus::Active,
    expires_at: Utc::now() + Duration::days(1),
    provider_id,
    category_id: None,
  }
}

fn cart_for(items: &[FoodItem]) -> Vec<CartLine> {
  items
    .iter()
    .map(|item| CartLine {
      item_id: item.id,
      provider_id: Some(item.provider_id),
      requested_quantity: 1,
      client_price: item.discounted_price,
    })
    .collect()
}

/// `providers` providers with `items_per_provider` items each, plenty of stock.
fn catalog(providers: usize, items_per_provider: usize) -> Vec<FoodItem> {
  (0..providers)
    .flat_map(|_| {
      let provider_id = Uuid::new_v4();
      (0..items_per_provider).map(move |_| bench_item(provider_id, i32::MAX / 2))
    })
    .collect()
}

// --- Benchmark Functions ---

fn bench_cart_validation(c: &mut Criterion) {
  let mut group = c.benchmark_group("CartValidation");
  let rt = Runtime::new().unwrap();

  for lines in [1usize, 10, 50] {
    let items = catalog(1, lines);
    let engine = Engine::new(Arc::new(MemoryStore::with_items(items.clone()))).unwrap();
    let cart = cart_for(&items);

    group.throughput(Throughput::Elements(lines as u64));
    group.bench_with_input(BenchmarkId::new("lines", lines), &cart, |b, cart| {
      b.to_async(&rt).iter(|| async { engine.validator().validate(cart).await.unwrap() });
    });
  }
  group.finish();
}

fn bench_checkout(c: &mut Criterion) {
  let mut group = c.benchmark_group("Checkout");
  let rt = Runtime::new().unwrap();

  for providers in [1usize, 3, 5] {
    let items = catalog(providers, 4);
    let engine = Engine::new(Arc::new(MemoryStore::with_items(items.clone()))).unwrap();
    let cart = cart_for(&items);

    group.throughput(Throughput::Elements(providers as u64));
    group.bench_with_input(BenchmarkId::new("providers", providers), &cart, |b, cart| {
      b.to_async(&rt).iter(|| async {
        let outcome = engine
          .checkout()
          .checkout(CheckoutRequest {
            user_profile_id: Uuid::new_v4(),
            lines: cart.clone(),
            delivery: DeliveryInfo {
              address: "1 Bench Rd".to_string(),
              notes: None,
            },
            payment_method: "CARD".to_string(),
          })
          .await
          .unwrap();
        criterion::black_box(outcome.orders.len())
      });
    });
  }
  group.finish();
}

fn bench_contended_decrement(c: &mut Criterion) {
  let mut group = c.benchmark_group("ContendedDecrement");
  let rt = Runtime::new().unwrap();

  for tasks in [1usize, 8, 32] {
    let item = bench_item(Uuid::new_v4(), i32::MAX);
    let item_id = item.id;
    let engine = Arc::new(Engine::new(Arc::new(MemoryStore::with_items([item]))).unwrap());

    group.throughput(Throughput::Elements(tasks as u64));
    group.bench_function(BenchmarkId::new("tasks", tasks), |b| {
      b.to_async(&rt).iter(|| {
        let engine = Arc::clone(&engine);
        async move {
          let handles: Vec<_> = (0..tasks)
            .map(|_| {
              let engine = Arc::clone(&engine);
              tokio::spawn(async move { engine.ledger().decrement(item_id, 1).await })
            })
            .collect();
          for handle in handles {
            handle.await.unwrap().unwrap();
          }
        }
      });
    });
  }
  group.finish();
}

fn bench_status_walk(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let items = catalog(1, 1);
  let provider_id = items[0].provider_id;
  let engine = Engine::new(Arc::new(MemoryStore::with_items(items.clone()))).unwrap();
  let cart = cart_for(&items);

  c.bench_function("StatusWalk/place_and_deliver", |b| {
    b.to_async(&rt).iter(|| async {
      let outcome = engine
        .checkout()
        .checkout(CheckoutRequest {
          user_profile_id: Uuid::new_v4(),
          lines: cart.clone(),
          delivery: DeliveryInfo {
            address: "1 Bench Rd".to_string(),
            notes: None,
          },
          payment_method: "CARD".to_string(),
        })
        .await
        .unwrap();
      let order_id = outcome.orders[0].order.id;
      for step in [
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::ReadyForPickup,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
      ] {
        engine
          .orders()
          .apply_transition(order_id, provider_id, step, None, None)
          .await
          .unwrap();
      }
    });
  });
}

criterion_group!(
  benches,
  bench_cart_validation,
  bench_checkout,
  bench_contended_decrement,
  bench_status_walk
);
criterion_main!(benches);
