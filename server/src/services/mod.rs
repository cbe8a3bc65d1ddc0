// foodloop/server/src/services/mod.rs
pub mod rating_relay;
