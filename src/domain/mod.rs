//! Domain model: report rows, derived values and run outcomes
pub mod aggregates;
pub mod events;
pub mod value_objects;
