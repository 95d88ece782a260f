//! docbench — synthetic document sets and search benchmarks
//!
//! Builds reproducible document sets whose search terms and facet values
//! occur with controlled frequency, streams them into a search engine, and
//! times indexing and querying. This crate re-exports the library crates so
//! that integration tests and benches can import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! catalog ──► docbench-core::schema ──► docs ──► runner ──► stats
//!    │
//!    └── docbench-emitters (field values)
//! ```
//!
//! Everything runs on the calling thread.

pub mod catalog;
pub mod cli;

pub use docbench_core as core;
pub use docbench_emitters as emitters;
