//! Shared test utilities for docbench integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Every helper is deterministic: schemas are seeded and
//! the scripted client replays fixed timings.

pub mod assertions;
pub mod builders;
pub mod fake_client;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fake_client::*;
pub use fixtures::*;
