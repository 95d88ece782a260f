//! docbench-core — document-search benchmark core library.
//!
//! This crate exposes the generation and measurement layers as public
//! modules, plus the shared types used across all of them.
//!
//! # Architecture
//!
//! ```text
//! terms ──► schema ──► docs ──► runner ──► stats
//!  (vocabulary,  (field     (produce,   (index,    (log,
//!   distribution) injection) persist,    search)    report)
//!                            restore)
//! ```
//!
//! Everything runs on the calling thread. The only blocking points are calls
//! into a [`client::SearchClient`] and persistence file I/O.

pub mod client;
pub mod config;
pub mod docs;
pub mod emitter;
pub mod error;
pub mod runner;
pub mod schema;
pub mod stats;
pub mod terms;
pub mod types;

pub use error::{ClientError, ConfigError, Error, GenerationError, Operation, PersistError, Result};
pub use types::Document;
