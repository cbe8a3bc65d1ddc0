// foodloop/src/lib.rs

//! foodloop: the order lifecycle and inventory-consistency engine of a
//! surplus-food marketplace.
//!
//!  - `ledger`: availability reads and guarded stock decrement / increment.
//!  - `cart`: side-effect-free re-validation of a client cart.
//!  - `checkout`: one atomic order per provider group, best-effort across groups.
//!  - `state_machine`: table-driven status transitions, go-back and cancellation.
//!  - `notifications`: provider notifications projected from orders.
//!  - `queries` / `reviews`: order read paths and the review flag.
//!
//! Persistence is reached through [`store::OrderStore`]; [`store::MemoryStore`]
//! is the in-process implementation.

pub mod cart;
pub mod checkout;
pub mod clock;
pub mod engine;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod queries;
pub mod reviews;
pub mod state_machine;
pub mod store;
pub mod workflow;

// --- Re-exports for the Public API ---

pub use crate::cart::{CartReport, CartValidator, LineIssue, LineReport};
pub use crate::checkout::{CheckoutOutcome, CheckoutRequest, CheckoutTransactor, ProviderFailure};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::error::{EngineError, EngineResult, WorkflowError};
pub use crate::fees::PriceBreakdown;
pub use crate::ledger::{Availability, InventoryLedger};
pub use crate::models::{CartLine, DeliveryInfo, FoodItem, FoodItemStatus, Order, OrderLineItem, OrderStatus, StatusLogEntry};
pub use crate::notifications::{NotificationRelay, ProviderNotification};
pub use crate::queries::{OrderQueries, OrderView, OrderViewer};
pub use crate::reviews::{RatingHook, ReviewDesk};
pub use crate::state_machine::OrderStateMachine;
pub use crate::store::{AppliedChange, MemoryStore, OrderStore, PlacedOrder};
