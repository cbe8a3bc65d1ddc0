// foodloop/server/src/db/seed.rs

//! Small demo catalog for local runs (`SEED_DB=true`).

use chrono::{Duration, Utc};
use foodloop::{EngineResult, FoodItem, FoodItemStatus, OrderStore};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Fixed provider ids so the seeded catalog can be addressed with stable headers.
pub const DEMO_BAKERY_ID: Uuid = Uuid::from_u128(0x0b5e_11e0_0000_4000_8000_0000_0000_0001);
pub const DEMO_DELI_ID: Uuid = Uuid::from_u128(0x0b5e_11e0_0000_4000_8000_0000_0000_0002);

struct DemoListing {
  name: &'static str,
  provider_id: Uuid,
  price_cents: i64,
  discounted_cents: i64,
  quantity: i32,
  hours_left: i64,
}

const DEMO_LISTINGS: &[DemoListing] = &[
  DemoListing {
    name: "Sourdough loaf",
    provider_id: DEMO_BAKERY_ID,
    price_cents: 650,
    discounted_cents: 300,
    quantity: 8,
    hours_left: 6,
  },
  DemoListing {
    name: "Pastry surprise bag",
    provider_id: DEMO_BAKERY_ID,
    price_cents: 1200,
    discounted_cents: 450,
    quantity: 5,
    hours_left: 4,
  },
  DemoListing {
    name: "Grain salad bowl",
    provider_id: DEMO_DELI_ID,
    price_cents: 1100,
    discounted_cents: 550,
    quantity: 6,
    hours_left: 3,
  },
  DemoListing {
    name: "Soup of the day (1L)",
    provider_id: DEMO_DELI_ID,
    price_cents: 900,
    discounted_cents: 400,
    quantity: 3,
    hours_left: 5,
  },
];

/// Inserts the demo listings with fresh expiry times. Returns how many were written.
pub async fn seed_demo_catalog(store: &dyn OrderStore) -> EngineResult<usize> {
  let now = Utc::now();
  for listing in DEMO_LISTINGS {
    store
      .save_food_item(FoodItem {
        id: Uuid::new_v4(),
        name: listing.name.to_string(),
        price: Decimal::new(listing.price_cents, 2),
        discounted_price: Decimal::new(listing.discounted_cents, 2),
        quantity: listing.quantity,
        status: FoodItemStatus::Active,
        expires_at: now + Duration::hours(listing.hours_left),
        provider_id: listing.provider_id,
        category_id: None,
      })
      .await?;
  }
  tracing::info!(listings = DEMO_LISTINGS.len(), "Demo catalog seeded.");
  Ok(DEMO_LISTINGS.len())
}
