#![allow(unused)]
//! Document-set persistence integration harness.
//!
//! # What this covers
//!
//! - **Round trip**: a persisted set replays with identical documents, in
//!   order, and the counts snapshot matches the documents.
//! - **Generate once, replay after**: a `DocSet` generates on its first pass
//!   and replays on later passes, including from a fresh process via
//!   `DocSet::from_disk`.
//! - **Append**: an explicit append pass doubles the set with new ids and
//!   merges counts.
//! - **Interrupted passes**: a pass abandoned half-way leaves the set
//!   incomplete, and the next pass starts over.
//! - **Damaged files**: truncated or corrupt document files are reported as
//!   persistence errors.
//!
//! # What this does NOT cover
//!
//! - Concurrent writers to one file set
//!
//! # Running
//!
//! ```sh
//! cargo test --test docs_harness
//! ```

mod common;
use common::*;

use docbench_core::docs::{persist, produce, restore, DocSet, FileSet, WriteMode};
use docbench_core::{Document, Error, PersistError};
use pretty_assertions::assert_eq;

fn drain<I: Iterator<Item = docbench_core::Result<Document>>>(docs: I) -> Vec<Document> {
    docs.collect::<docbench_core::Result<Vec<_>>>().expect("stream must not fail")
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn persist_then_restore_is_identity() {
    let dir = temp_dir();
    let schema = CorpusBuilder::new(150).ratio(2.0).build();
    let fileset = FileSet::new(dir.path(), "rt");

    let written = persist(produce(&schema), &fileset, WriteMode::Overwrite, &schema.facet_field_names()).unwrap();
    assert_eq!(written, 150);
    assert!(fileset.is_complete());

    let original: Vec<Document> = schema.documents().collect();
    let restored: Vec<Document> = restore(&fileset).unwrap().map(Result::unwrap).collect();
    assert_eq!(restored, original);

    let counts = fileset.load_counts().unwrap();
    assert_eq!(counts.total_docs, 150);
}

#[test]
fn docset_generates_once_then_replays() {
    let dir = temp_dir();
    let schema = CorpusBuilder::new(60).build();
    let expected: Vec<Document> = schema.documents().collect();
    let search_terms = schema.search_terms().clone();

    let mut set = DocSet::from_schema("once", schema, Some(dir.path().to_path_buf())).unwrap();
    let first = set.docs().unwrap();
    assert!(!first.is_replay());
    assert_eq!(drain(first), expected);

    let second = set.docs().unwrap();
    assert!(second.is_replay());
    assert_eq!(drain(second), expected);

    let mut reopened = DocSet::from_disk("once", dir.path()).unwrap();
    assert_eq!(reopened.search_terms(), &search_terms);
    assert_eq!(drain(reopened.docs().unwrap()), expected);
    assert_eq!(reopened.counts().unwrap().unwrap().total_docs, 60);
}

#[test]
fn docset_without_savepath_always_generates() {
    let mut set = DocSet::from_schema("mem", CorpusBuilder::new(10).build(), None).unwrap();
    assert!(!set.docs().unwrap().is_replay());
    assert!(!set.docs().unwrap().is_replay());
    assert!(set.fileset().is_none());
    assert_eq!(set.counts().unwrap(), None);
}

#[test]
fn append_pass_doubles_the_set() {
    let dir = temp_dir();
    let mut set = DocSet::from_schema("grow", CorpusBuilder::new(40).build(), Some(dir.path().to_path_buf())).unwrap();
    drain(set.docs().unwrap());
    let before = set.counts().unwrap().unwrap();

    let first = drain(set.docs().unwrap());

    set.regenerate(WriteMode::Append).unwrap();
    let pass = set.docs().unwrap();
    assert!(!pass.is_replay());
    drain(pass);

    let after = set.counts().unwrap().unwrap();
    assert_eq!(after.total_docs, 80);
    let colours: usize = COLOURS.iter().map(|c| after.count_of("colour", c)).sum();
    assert_eq!(colours, 80);
    for colour in COLOURS {
        assert!(after.count_of("colour", colour) >= before.count_of("colour", colour), "{colour}");
    }

    let all = drain(set.docs().unwrap());
    assert_eq!(all.len(), 80);
    assert_eq!(&all[..40], &first[..]);
    let ids: std::collections::HashSet<&str> = all.iter().flat_map(|d| d.strings("id")).collect();
    assert_eq!(ids.len(), 80, "appended documents reuse ids");
}

#[test]
fn append_after_an_interrupted_pass_starts_over() {
    let dir = temp_dir();
    let mut set = DocSet::from_schema("torn", CorpusBuilder::new(30).build(), Some(dir.path().to_path_buf())).unwrap();
    drain(set.docs().unwrap().take(10));

    set.regenerate(WriteMode::Append).unwrap();
    assert_eq!(drain(set.docs().unwrap()).len(), 30);
    assert_eq!(set.counts().unwrap().unwrap().total_docs, 30);
    assert_eq!(drain(set.docs().unwrap()).len(), 30);
}

#[test]
fn replayed_set_cannot_regenerate() {
    let dir = temp_dir();
    let mut set = DocSet::from_schema("frozen", CorpusBuilder::new(5).build(), Some(dir.path().to_path_buf())).unwrap();
    drain(set.docs().unwrap());

    let mut reopened = DocSet::from_disk("frozen", dir.path()).unwrap();
    assert!(reopened.regenerate(WriteMode::Overwrite).is_err());
}

// ---------------------------------------------------------------------------
// Interrupted and damaged sets
// ---------------------------------------------------------------------------

#[test]
fn interrupted_pass_starts_over() {
    let dir = temp_dir();
    let mut set = DocSet::from_schema("cut", CorpusBuilder::new(50).build(), Some(dir.path().to_path_buf())).unwrap();
    {
        let partial: Vec<_> = set.docs().unwrap().take(10).collect();
        assert_eq!(partial.len(), 10);
    }
    let fileset = set.fileset().unwrap().clone();
    assert!(!fileset.is_complete());
    assert!(matches!(DocSet::from_disk("cut", dir.path()), Err(Error::Persist(PersistError::Missing { .. }))));

    let retry = set.docs().unwrap();
    assert!(!retry.is_replay());
    assert_eq!(drain(retry).len(), 50);
    assert!(fileset.is_complete());
}

#[test]
fn truncated_docs_file_is_reported() {
    let dir = temp_dir();
    let schema = CorpusBuilder::new(20).build();
    let fileset = FileSet::new(dir.path(), "short");
    persist(produce(&schema), &fileset, WriteMode::Overwrite, &schema.facet_field_names()).unwrap();

    let text = std::fs::read_to_string(fileset.docs_path()).unwrap();
    let kept: Vec<&str> = text.lines().take(15).collect();
    std::fs::write(fileset.docs_path(), kept.join("\n") + "\n").unwrap();

    let results: Vec<_> = restore(&fileset).unwrap().collect();
    assert_eq!(results.len(), 16);
    assert!(matches!(
        results.last(),
        Some(Err(PersistError::Truncated { expected: 20, found: 15, .. }))
    ));
}

#[test]
fn corrupt_line_stops_the_replay() {
    let dir = temp_dir();
    let schema = CorpusBuilder::new(5).build();
    let fileset = FileSet::new(dir.path(), "bad");
    persist(produce(&schema), &fileset, WriteMode::Overwrite, &[]).unwrap();

    let mut lines: Vec<String> = std::fs::read_to_string(fileset.docs_path()).unwrap().lines().map(String::from).collect();
    lines[2] = "{not json".to_string();
    std::fs::write(fileset.docs_path(), lines.join("\n")).unwrap();

    let results: Vec<_> = restore(&fileset).unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(matches!(results[2], Err(PersistError::Corrupt { line: 3, .. })));
}

#[test]
fn clear_removes_everything_and_tolerates_absence() {
    let dir = temp_dir();
    let schema = CorpusBuilder::new(5).build();
    let mut set = DocSet::from_schema("gone", schema, Some(dir.path().to_path_buf())).unwrap();
    drain(set.docs().unwrap());

    let fileset = set.fileset().unwrap().clone();
    assert!(fileset.terms_path().is_file());
    fileset.clear().unwrap();
    assert!(!fileset.terms_path().exists());
    assert!(!fileset.docs_path().exists());
    assert!(!fileset.counts_path().exists());
    fileset.clear().unwrap();
}

#[test]
fn file_names_follow_the_id() {
    let fileset = FileSet::new("/data/sets", "books");
    assert!(fileset.terms_path().ends_with("books_terms.json"));
    assert!(fileset.docs_path().ends_with("books_docs.jsonl"));
    assert!(fileset.counts_path().ends_with("books_counts.json"));
}
