//! Order intake and the status engine.

pub mod engine;

pub use engine::{ChatProvision, OrderStatusEngine, StatusOutcome};
