//! The built-in catalog schema used by the CLI.
//!
//! A library-catalogue style record: a title and body that receive search
//! terms, a colour facet, a multi-valued subject facet with a searchable
//! text copy, and a few plain fields.

use chrono::{TimeZone, Utc};
use docbench_core::config::GenerateConfig;
use docbench_core::emitter::into_value;
use docbench_core::schema::{Cardinality, ConfiguredSchema, FieldDef, InjectionParams, Schema};
use docbench_core::terms::search_terms;
use docbench_core::{ConfigError, Result};
use docbench_emitters::{Capitalize, Choice, DateRange, IntRange, Letters, LoremWord, PersonName, Sentence, SequentialId};

pub const COLOURS: [&str; 8] = ["red", "orange", "yellow", "green", "blue", "indigo", "violet", "black"];

/// Names of the fields search terms are injected into.
pub const SEARCH_FIELDS: [&str; 3] = ["title", "body", "subject_text"];

/// Words search terms are built from.
pub fn term_words() -> Letters {
    Letters::new(3, 9)
}

pub fn schema() -> Result<Schema, ConfigError> {
    let oldest = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single();
    let newest = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).single();
    let (Some(oldest), Some(newest)) = (oldest, newest) else {
        return Err(ConfigError::Invalid("catalog date range".into()));
    };

    Schema::builder()
        .field(FieldDef::plain("id", into_value(SequentialId::new("doc-", 8))))
        .field(FieldDef::search("title", into_value(Capitalize(Sentence::new(3..8)))))
        .field(FieldDef::search("body", into_value(Sentence::new(12..30))).gate(0.9))
        .field(FieldDef::plain("author", into_value(PersonName)).gate(0.8))
        .field(FieldDef::plain("keyword", into_value(LoremWord)).gate(0.6))
        .field(FieldDef::facet("colour", Choice::new(COLOURS), Cardinality::Fixed(COLOURS.len())))
        .field(
            FieldDef::facet("subject", Capitalize(Letters::new(4, 10)), Cardinality::PerDocs { factor: 0.01, floor: 10 })
                .repeat(1, 3),
        )
        .field(FieldDef::copy_of("subject_text", "subject").searchable())
        .field(FieldDef::plain("pub_year", into_value(IntRange::new(1950, 2024))).gate(0.95))
        .field(FieldDef::plain("created", into_value(DateRange::new(oldest, newest))))
        .build()
}

/// Build the search terms and configure the catalog schema from `[generate]`.
pub fn configure(cfg: &GenerateConfig) -> Result<ConfiguredSchema> {
    let counts = cfg.phrase_counts();
    let terms = search_terms(&term_words(), cfg.vocab_size, Some(counts.as_slice()), cfg.seed)?;
    let skew = cfg.skew(terms.len());
    schema()?.configure(InjectionParams {
        num_docs: cfg.num_docs,
        search_terms: terms,
        skew,
        term_doc_ratio: cfg.term_doc_ratio,
        overwrite_chance: cfg.overwrite_chance,
        seed: cfg.seed,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
