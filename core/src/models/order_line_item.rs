// foodloop/src/models/order_line_item.rs

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One purchased item. `price` is the unit price at checkout and is never
/// touched again, whatever happens to the food item afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub food_item_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
}
