// foodloop/src/models/cart.rs

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// A client-held cart line. Never persisted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub item_id: Uuid,
  /// Required by checkout for grouping; the validator ignores it.
  #[serde(default)]
  pub provider_id: Option<Uuid>,
  pub requested_quantity: i32,
  /// The discounted price the client last saw.
  pub client_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
  pub address: String,
  #[serde(default)]
  pub notes: Option<String>,
}

/// Total requested quantity per item, in the order items first appear.
///
/// An item may sit on several lines; stock has to cover the sum.
pub fn requested_per_item(lines: &[CartLine]) -> EngineResult<Vec<(Uuid, i32)>> {
  let mut totals: Vec<(Uuid, i32)> = Vec::new();
  for line in lines {
    match totals.iter_mut().find(|(id, _)| *id == line.item_id) {
      Some((_, total)) => {
        *total = total.checked_add(line.requested_quantity).ok_or_else(|| {
          EngineError::validation(format!("requested quantity for item {} is too large", line.item_id))
        })?;
      }
      None => totals.push((line.item_id, line.requested_quantity)),
    }
  }
  Ok(totals)
}
