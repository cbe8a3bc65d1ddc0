// foodloop/src/workflow/mod.rs

//! A minimal async step pipeline.
//!
//! A `Pipeline<TData, Err>` is an ordered list of named steps. Each step has
//! `on` handlers and optional `after` handlers; every handler receives a
//! clone of the shared `ContextData<TData>`, and the first error ends the
//! run. Checkout runs one pipeline per provider group.

pub mod context_data;
pub mod definition;
pub mod execution;
pub mod hooks;

pub use context_data::ContextData;
pub use definition::{Handler, Pipeline};
