// foodloop/src/models/mod.rs

//! Records the engine reads and writes. Persistence layers map their rows onto these.

pub mod cart;
pub mod food_item;
pub mod order;
pub mod order_line_item;
pub mod status_log;

pub use cart::{requested_per_item, CartLine, DeliveryInfo};
pub use food_item::{FoodItem, FoodItemStatus};
pub use order::{Order, OrderStatus};
pub use order_line_item::OrderLineItem;
pub use status_log::StatusLogEntry;
