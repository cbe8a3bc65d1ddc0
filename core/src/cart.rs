// foodloop/src/cart.rs

//! Advisory re-check of a client-held cart against live stock and prices.
//!
//! Nothing here writes: the validator only reads item rows, so it can be
//! called as often as the client likes.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::fees::PriceBreakdown;
use crate::ledger::InventoryLedger;
use crate::models::{requested_per_item, CartLine, FoodItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineIssue {
  Unavailable,
  InsufficientStock,
  PriceChanged,
}

/// Current state of an item, returned with every line that is still valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
  pub name: String,
  pub provider_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
  pub discounted_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineReport {
  pub item_id: Uuid,
  pub requested_quantity: i32,
  pub valid: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<LineIssue>,
  /// Drop the line from the cart.
  pub remove: bool,
  /// Keep the line but update its quantity or price.
  pub adjust: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub actual_quantity: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub actual_price: Option<Decimal>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub item: Option<ItemSnapshot>,
}

impl LineReport {
  fn unavailable(line: &CartLine) -> Self {
    Self {
      item_id: line.item_id,
      requested_quantity: line.requested_quantity,
      valid: false,
      reason: Some(LineIssue::Unavailable),
      remove: true,
      adjust: false,
      actual_quantity: None,
      actual_price: None,
      item: None,
    }
  }

  fn adjustable(line: &CartLine, issue: LineIssue, item: &FoodItem) -> Self {
    let (actual_quantity, actual_price) = match issue {
      LineIssue::InsufficientStock => (Some(item.quantity), None),
      _ => (None, Some(item.discounted_price)),
    };
    Self {
      item_id: line.item_id,
      requested_quantity: line.requested_quantity,
      valid: false,
      reason: Some(issue),
      remove: false,
      adjust: true,
      actual_quantity,
      actual_price,
      item: None,
    }
  }

  fn ok(line: &CartLine, item: &FoodItem) -> Self {
    Self {
      item_id: line.item_id,
      requested_quantity: line.requested_quantity,
      valid: true,
      reason: None,
      remove: false,
      adjust: false,
      actual_quantity: None,
      actual_price: None,
      item: Some(ItemSnapshot {
        name: item.name.clone(),
        provider_id: item.provider_id,
        quantity: item.quantity,
        price: item.price,
        discounted_price: item.discounted_price,
      }),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartReport {
  /// True only if every line is valid.
  pub valid: bool,
  pub lines: Vec<LineReport>,
  /// Totals of the valid lines at current prices, fees included.
  pub preview: PriceBreakdown,
}

#[derive(Debug, Clone)]
pub struct CartValidator {
  ledger: InventoryLedger,
}

impl CartValidator {
  pub fn new(ledger: InventoryLedger) -> Self {
    Self { ledger }
  }

  /// Checks each line in order: unavailable, then stock, then price.
  ///
  /// Stock is compared against the total requested for the item across all
  /// lines, as checkout does. Business-rule failures are reported per line;
  /// only malformed input (a non-positive or overflowing quantity) is an error.
  #[instrument(name = "cart::validate", skip_all, fields(lines = lines.len()))]
  pub async fn validate(&self, lines: &[CartLine]) -> EngineResult<CartReport> {
    if let Some(bad) = lines.iter().find(|l| l.requested_quantity <= 0) {
      return Err(EngineError::validation(format!(
        "requested quantity for item {} must be positive",
        bad.item_id
      )));
    }

    let requested: HashMap<Uuid, i32> = requested_per_item(lines)?.into_iter().collect();
    let ids: Vec<Uuid> = requested.keys().copied().collect();
    let items: HashMap<Uuid, FoodItem> = self
      .ledger
      .snapshot(&ids)
      .await?
      .into_iter()
      .map(|item| (item.id, item))
      .collect();
    let now = self.ledger.now();

    let reports: Vec<LineReport> = lines
      .iter()
      .map(|line| match items.get(&line.item_id) {
        Some(item) if item.is_available_at(now) => {
          let total = requested.get(&line.item_id).copied().unwrap_or(line.requested_quantity);
          if total > item.quantity {
            LineReport::adjustable(line, LineIssue::InsufficientStock, item)
          } else if line.client_price != item.discounted_price {
            LineReport::adjustable(line, LineIssue::PriceChanged, item)
          } else {
            LineReport::ok(line, item)
          }
        }
        _ => LineReport::unavailable(line),
      })
      .collect();

    let preview = PriceBreakdown::from_lines(reports.iter().filter(|r| r.valid).filter_map(|r| {
      r.item
        .as_ref()
        .map(|snapshot| (snapshot.discounted_price, r.requested_quantity))
    }));

    Ok(CartReport {
      valid: reports.iter().all(|r| r.valid),
      lines: reports,
      preview,
    })
  }
}
