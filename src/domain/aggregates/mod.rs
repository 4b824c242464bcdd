//! Aggregates module
pub mod order;

pub use order::{columns, OrderAggregator, OrderGroup, OrderLine};
