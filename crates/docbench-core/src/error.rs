//! Error taxonomy.
//!
//! Each failure class gets its own enum so that a broken engine is never
//! reported the same way as a broken benchmark configuration. [`Error`] is the
//! umbrella type returned by operations that can hit more than one class.

use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A search client call failed. Carries the operation and, where known,
    /// the run label and the search term that was in flight.
    #[error("{operation} failed (label: {label:?}, term: {term:?}): {source}")]
    Client {
        operation: Operation,
        label: Option<String>,
        term: Option<String>,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl Error {
    pub fn client(operation: Operation, label: Option<&str>, term: Option<&str>, source: ClientError) -> Self {
        Error::Client {
            operation,
            label: label.map(str::to_string),
            term: term.map(str::to_string),
            source,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_client(&self) -> bool {
        matches!(self, Error::Client { .. })
    }
}

/// Search client operation, used to tag client failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Commit,
    Search,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Add => write!(f, "add"),
            Operation::Commit => write!(f, "commit"),
            Operation::Search => write!(f, "search"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Invalid parameters. Raised before any generation or I/O starts; values are
/// never clamped into range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("ignore_n ({ignore_n}) must be less than rep_n ({rep_n})")]
    IgnoreNotBelowReps { rep_n: usize, ignore_n: usize },

    #[error("invalid skew: {0}")]
    Skew(String),

    #[error("invalid repeat range {min}..={max}")]
    RepeatRange { min: usize, max: usize },

    #[error("slots may ask for {per_slot} distinct items but the vocabulary holds only {vocab_len}")]
    PerSlotAboveVocabulary { per_slot: usize, vocab_len: usize },

    #[error("facet `{field}` repeats up to {max} distinct values but its cardinality is {cardinality}")]
    RepeatAboveCardinality { field: String, max: usize, cardinality: usize },

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("field `{field}` copies `{target}`, which is not defined before it")]
    UnresolvedCopy { field: String, target: String },

    #[error("schema has no search fields to inject terms into")]
    NoSearchFields,

    #[error("term:doc ratio {requested} is outside (0, {max}]")]
    TermDocRatio { requested: f64, max: f64 },

    #[error("slot {slot} is outside the configured document count {num_docs}")]
    SlotOutOfRange { slot: usize, num_docs: usize },

    #[error("vocabulary contains duplicate value {0:?}")]
    DuplicateTerm(String),

    #[error("runner cannot {action} while {state}")]
    InvalidState { action: &'static str, state: crate::runner::RunState },

    #[error("document set `{0}` has no schema to regenerate from")]
    NoSchema(String),

    #[error("{0}")]
    Invalid(String),

    #[error("configuration source: {0}")]
    Source(#[from] config::ConfigError),
}

/// Returns `value` if it lies in `[0, 1]`.
pub(crate) fn unit_interval(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

// ---------------------------------------------------------------------------
// Generation errors
// ---------------------------------------------------------------------------

/// A vocabulary could not be filled. Always raised at build time.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("emitter can produce at most {available} unique values; {requested} requested")]
    Exhausted { available: usize, requested: usize },

    #[error("found only {found} of {requested} unique values after {attempts} draws")]
    Stalled { found: usize, requested: usize, attempts: usize },

    #[error("cannot build {requested} distinct {words}-word phrases from {vocab} words")]
    PhraseSpace { words: usize, requested: usize, vocab: usize },

    #[error("word weights: {0}")]
    Weights(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Client errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::client::SearchClient`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("engine returned status {status}: {message}")]
    Engine { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("{path:?}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("{path:?} line {line}: {source}")]
    Corrupt { path: PathBuf, line: usize, source: serde_json::Error },

    #[error("{path:?}: expected {expected} documents, found {found}")]
    Truncated { path: PathBuf, expected: usize, found: usize },

    #[error("no persisted document set `{id}` in {dir:?}")]
    Missing { dir: PathBuf, id: String },
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PersistError::Json { path: path.into(), source }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
