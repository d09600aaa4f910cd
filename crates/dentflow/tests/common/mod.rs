//! Shared test utilities for dentflow integration tests.
//!
//! - `TestHarness` wires every service over a file-backed database in a
//!   temp directory
//! - builders for intake records

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
