// foodloop/src/engine.rs

//! One handle over a store, a clock and every component built on them.

use std::sync::Arc;

use crate::cart::CartValidator;
use crate::checkout::CheckoutTransactor;
use crate::clock::{Clock, SystemClock};
use crate::error::EngineResult;
use crate::ledger::InventoryLedger;
use crate::notifications::NotificationRelay;
use crate::queries::OrderQueries;
use crate::reviews::{RatingHook, ReviewDesk};
use crate::state_machine::OrderStateMachine;
use crate::store::OrderStore;

#[derive(Debug)]
pub struct Engine {
  ledger: InventoryLedger,
  validator: CartValidator,
  checkout: CheckoutTransactor,
  orders: OrderStateMachine,
  notifications: NotificationRelay,
  queries: OrderQueries,
  reviews: ReviewDesk,
}

impl Engine {
  pub fn new(store: Arc<dyn OrderStore>) -> EngineResult<Self> {
    Self::builder(store).build()
  }

  pub fn builder(store: Arc<dyn OrderStore>) -> EngineBuilder {
    EngineBuilder {
      store,
      clock: Arc::new(SystemClock),
      rating_hook: None,
    }
  }

  pub fn ledger(&self) -> &InventoryLedger {
    &self.ledger
  }

  pub fn validator(&self) -> &CartValidator {
    &self.validator
  }

  pub fn checkout(&self) -> &CheckoutTransactor {
    &self.checkout
  }

  pub fn orders(&self) -> &OrderStateMachine {
    &self.orders
  }

  pub fn notifications(&self) -> &NotificationRelay {
    &self.notifications
  }

  pub fn queries(&self) -> &OrderQueries {
    &self.queries
  }

  pub fn reviews(&self) -> &ReviewDesk {
    &self.reviews
  }
}

pub struct EngineBuilder {
  store: Arc<dyn OrderStore>,
  clock: Arc<dyn Clock>,
  rating_hook: Option<Arc<dyn RatingHook>>,
}

impl EngineBuilder {
  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn rating_hook(mut self, hook: Arc<dyn RatingHook>) -> Self {
    self.rating_hook = Some(hook);
    self
  }

  pub fn build(self) -> EngineResult<Engine> {
    let ledger = InventoryLedger::new(Arc::clone(&self.store), Arc::clone(&self.clock));
    Ok(Engine {
      validator: CartValidator::new(ledger.clone()),
      checkout: CheckoutTransactor::new(ledger.clone(), Arc::clone(&self.store), Arc::clone(&self.clock))?,
      orders: OrderStateMachine::new(Arc::clone(&self.store), Arc::clone(&self.clock)),
      notifications: NotificationRelay::new(Arc::clone(&self.store)),
      queries: OrderQueries::new(Arc::clone(&self.store), ledger.clone()),
      reviews: ReviewDesk::new(Arc::clone(&self.store), self.rating_hook),
      ledger,
    })
  }
}
