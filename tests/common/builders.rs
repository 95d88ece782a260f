//! Test builders for schemas, documents and statistics logs.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use docbench_core::emitter::into_value;
use docbench_core::schema::{Cardinality, ConfiguredSchema, FieldDef, InjectionParams, Schema};
use docbench_core::stats::{RunMetadata, StatsLog, TimingRecord};
use docbench_core::terms::{search_terms, Skew, Vocabulary};
use docbench_core::Document;
use docbench_emitters::{Choice, Letters, Sentence, SequentialId};
use serde_json::Value;

use super::fixtures::{COLOURS, SEED};

// ---------------------------------------------------------------------------
// CorpusBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a small configured corpus.
///
/// The schema has an id, two search fields (`title`, and `body` present in
/// half the documents), a `colour` facet, a multi-valued `tags` facet and a
/// searchable copy of it.
///
/// ```rust
/// let schema = CorpusBuilder::new(500).vocab(40).ratio(1.5).build();
/// ```
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    num_docs: usize,
    vocab: usize,
    phrases: Vec<usize>,
    seed: u64,
    ratio: f64,
    overwrite: f64,
    skew: Skew,
}

impl CorpusBuilder {
    pub fn new(num_docs: usize) -> Self {
        Self {
            num_docs,
            vocab: 20,
            phrases: Vec::new(),
            seed: SEED,
            ratio: 1.0,
            overwrite: 0.0,
            skew: Skew::Uniform,
        }
    }

    pub fn vocab(mut self, n: usize) -> Self {
        self.vocab = n;
        self
    }

    pub fn phrases(mut self, counts: &[usize]) -> Self {
        self.phrases = counts.to_vec();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn overwrite(mut self, chance: f64) -> Self {
        self.overwrite = chance;
        self
    }

    pub fn skew(mut self, skew: Skew) -> Self {
        self.skew = skew;
        self
    }

    pub fn terms(&self) -> Vocabulary {
        search_terms(&Letters::new(3, 8), self.vocab, Some(self.phrases.as_slice()), self.seed)
            .expect("test vocabulary must build")
    }

    pub fn params(&self) -> InjectionParams {
        InjectionParams {
            num_docs: self.num_docs,
            search_terms: self.terms(),
            skew: self.skew.clone(),
            term_doc_ratio: self.ratio,
            overwrite_chance: self.overwrite,
            seed: self.seed,
        }
    }

    pub fn build(&self) -> ConfiguredSchema {
        test_schema().configure(self.params()).expect("test schema must configure")
    }
}

/// The unconfigured schema behind [`CorpusBuilder`].
pub fn test_schema() -> Schema {
    Schema::builder()
        .field(FieldDef::plain("id", into_value(SequentialId::new("t", 5))))
        .field(FieldDef::search("title", into_value(Sentence::new(2..5))))
        .field(FieldDef::search("body", into_value(Sentence::new(5..12))).gate(0.5))
        .field(FieldDef::facet("colour", Choice::new(COLOURS.iter().copied()), Cardinality::Fixed(COLOURS.len())))
        .field(FieldDef::facet("tags", Letters::new(4, 6), Cardinality::Fixed(12)).repeat(1, 3))
        .field(FieldDef::copy_of("tags_text", "tags").searchable())
        .build()
        .expect("test schema must validate")
}

// ---------------------------------------------------------------------------
// Documents and logs
// ---------------------------------------------------------------------------

/// A document from `(field, value)` pairs, in order.
pub fn doc(pairs: &[(&str, Value)]) -> Document {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// A log whose records are search timings: `(label, term, elapsed_ms)`.
pub fn search_log(test_id: &str, searches: &[(&str, &str, f64)]) -> StatsLog {
    let mut log = StatsLog::new(RunMetadata::new(test_id));
    for (label, term, ms) in searches {
        log.append(TimingRecord::search(*label, *term, *ms, 1, 0));
    }
    log
}
