// foodloop/src/fees.rs

//! Process-wide delivery and service fees and the money math built on them.
//!
//! Cart previews, checkout totals and every order read path go through
//! [`PriceBreakdown`], so a total shown before checkout is the total charged.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Flat delivery fee in cents.
pub const DELIVERY_FEE_CENTS: i64 = 299;
/// Flat service fee in cents.
pub const SERVICE_FEE_CENTS: i64 = 150;

pub fn delivery_fee() -> Decimal {
  Decimal::new(DELIVERY_FEE_CENTS, 2)
}

pub fn service_fee() -> Decimal {
  Decimal::new(SERVICE_FEE_CENTS, 2)
}

/// Rounds to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
  pub subtotal: Decimal,
  pub delivery_fee: Decimal,
  pub service_fee: Decimal,
  pub total: Decimal,
}

impl PriceBreakdown {
  pub fn from_subtotal(subtotal: Decimal) -> Self {
    let subtotal = round_money(subtotal);
    let delivery_fee = delivery_fee();
    let service_fee = service_fee();
    Self {
      subtotal,
      delivery_fee,
      service_fee,
      total: round_money(subtotal + delivery_fee + service_fee),
    }
  }

  /// Builds the breakdown from `(unit price, quantity)` pairs.
  pub fn from_lines<I>(lines: I) -> Self
  where
    I: IntoIterator<Item = (Decimal, i32)>,
  {
    let subtotal = lines
      .into_iter()
      .fold(Decimal::ZERO, |acc, (price, quantity)| acc + price * Decimal::from(quantity));
    Self::from_subtotal(subtotal)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fees_are_fixed_amounts() {
    assert_eq!(delivery_fee(), Decimal::new(299, 2));
    assert_eq!(service_fee(), Decimal::new(150, 2));
  }

  #[test]
  fn breakdown_adds_both_fees_to_subtotal() {
    let breakdown = PriceBreakdown::from_lines([(Decimal::new(1000, 2), 3), (Decimal::new(250, 2), 2)]);
    assert_eq!(breakdown.subtotal, Decimal::new(3500, 2));
    assert_eq!(breakdown.total, Decimal::new(3500 + 299 + 150, 2));
  }

  #[test]
  fn empty_cart_still_carries_fees() {
    let breakdown = PriceBreakdown::from_lines(std::iter::empty());
    assert_eq!(breakdown.subtotal, Decimal::ZERO);
    assert_eq!(breakdown.total, Decimal::new(449, 2));
  }

  #[test]
  fn rounds_half_cents_away_from_zero() {
    assert_eq!(round_money(Decimal::new(10005, 3)), Decimal::new(1001, 2));
    assert_eq!(round_money(Decimal::new(10004, 3)), Decimal::new(1000, 2));
  }
}
