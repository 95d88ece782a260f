//! Statistics log and report compiler.
//!
//! A [`StatsLog`] is the append-only record of one benchmark run: the run's
//! [`RunMetadata`] plus every [`TimingRecord`]. It round-trips through JSON so
//! reports can be compiled long after the run.
//!
//! Reports are never stored. [`StatsLog::compile_report`] recomputes them
//! from the records every time, and the same log with the same groupings
//! always yields the same report.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::MATCH_ALL;
use crate::error::PersistError;

// ---------------------------------------------------------------------------
// Run metadata
// ---------------------------------------------------------------------------

/// Conditions of one benchmark run. Never mutated; see [`RunMetadata::derive`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub test_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<String>,
    pub engine_version: Option<String>,
    pub engine_caches: Option<String>,
    pub engine_config: Option<String>,
    pub engine_schema: Option<String>,
    pub os: Option<String>,
    pub os_memory: Option<String>,
    pub jvm_memory: Option<String>,
    pub jvm_settings: Option<String>,
    pub collection_size: Option<String>,
    pub notes: Option<String>,
}

/// Field overrides for [`RunMetadata::derive`]. `None` keeps the source value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataPatch {
    pub engine_version: Option<String>,
    pub engine_caches: Option<String>,
    pub engine_config: Option<String>,
    pub engine_schema: Option<String>,
    pub os: Option<String>,
    pub os_memory: Option<String>,
    pub jvm_memory: Option<String>,
    pub jvm_settings: Option<String>,
    pub collection_size: Option<String>,
    pub notes: Option<String>,
}

impl RunMetadata {
    pub fn new(test_id: impl Into<String>) -> Self {
        Self { test_id: test_id.into(), ..Self::default() }
    }

    /// A new record for `test_id` that inherits every field from `self`
    /// except those set in `patch`.
    pub fn derive(&self, test_id: impl Into<String>, patch: MetadataPatch) -> Self {
        let keep = |new: Option<String>, old: &Option<String>| new.or_else(|| old.clone());
        Self {
            test_id: test_id.into(),
            derived_from: Some(self.test_id.clone()),
            engine_version: keep(patch.engine_version, &self.engine_version),
            engine_caches: keep(patch.engine_caches, &self.engine_caches),
            engine_config: keep(patch.engine_config, &self.engine_config),
            engine_schema: keep(patch.engine_schema, &self.engine_schema),
            os: keep(patch.os, &self.os),
            os_memory: keep(patch.os_memory, &self.os_memory),
            jvm_memory: keep(patch.jvm_memory, &self.jvm_memory),
            jvm_settings: keep(patch.jvm_settings, &self.jvm_settings),
            collection_size: keep(patch.collection_size, &self.collection_size),
            notes: keep(patch.notes, &self.notes),
        }
    }
}

// ---------------------------------------------------------------------------
// Timing records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    IndexBatch,
    Commit,
    Search,
}

/// One measured operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub kind: RecordKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    pub elapsed_ms: f64,
    /// Documents in the batch, or repetitions averaged for a search.
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<u64>,
}

impl TimingRecord {
    pub fn index_batch(label: impl Into<String>, elapsed_ms: f64, docs: usize) -> Self {
        Self { kind: RecordKind::IndexBatch, label: label.into(), term: None, elapsed_ms, count: docs, hits: None }
    }

    pub fn commit(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self { kind: RecordKind::Commit, label: label.into(), term: None, elapsed_ms, count: 1, hits: None }
    }

    pub fn search(label: impl Into<String>, term: impl Into<String>, elapsed_ms: f64, reps: usize, hits: u64) -> Self {
        Self {
            kind: RecordKind::Search,
            label: label.into(),
            term: Some(term.into()),
            elapsed_ms,
            count: reps,
            hits: Some(hits),
        }
    }

    /// A search for the blank term, issued as match-all.
    pub fn is_match_all(&self) -> bool {
        self.kind == RecordKind::Search
            && self.term.as_deref().map_or(true, |t| t.trim().is_empty() || t == MATCH_ALL)
    }
}

// ---------------------------------------------------------------------------
// Statistics log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsLog {
    metadata: RunMetadata,
    created_at: DateTime<Utc>,
    records: Vec<TimingRecord>,
}

impl StatsLog {
    pub fn new(metadata: RunMetadata) -> Self {
        Self { metadata, created_at: Utc::now(), records: Vec::new() }
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn records(&self) -> &[TimingRecord] {
        &self.records
    }

    pub fn append(&mut self, record: TimingRecord) {
        self.records.push(record);
    }

    pub fn labels(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| PersistError::io(path, e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, self).map_err(|e| PersistError::json(path, e))?;
        out.flush().map_err(|e| PersistError::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let file = File::open(path).map_err(|e| PersistError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PersistError::json(path, e))
    }

    /// Per-label summaries for every label in the log, plus one summary per
    /// grouping. Labels a grouping names but the log lacks contribute nothing.
    pub fn compile_report(&self, groupings: &Groupings) -> Report {
        let labels = self
            .labels()
            .into_iter()
            .map(|label| (label.to_string(), GroupSummary::of(self.records.iter().filter(|r| r.label == label))))
            .collect();

        let groups = groupings
            .iter()
            .map(|(name, members)| {
                let summary = GroupSummary::of(self.records.iter().filter(|r| members.contains(&r.label)));
                (name.clone(), summary)
            })
            .collect();

        Report { labels, groups }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Aggregate label → labels it combines.
pub type Groupings = BTreeMap<String, BTreeSet<String>>;

/// Count, total and spread of elapsed times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    /// Sum of the records' `count` (documents indexed, repetitions kept).
    pub items: usize,
    pub total_ms: f64,
    pub mean_ms: Option<f64>,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

impl Summary {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a TimingRecord>) -> Self {
        let mut s = Summary::default();
        for r in records {
            s.count += 1;
            s.items += r.count;
            s.total_ms += r.elapsed_ms;
            s.min_ms = Some(s.min_ms.map_or(r.elapsed_ms, |m| m.min(r.elapsed_ms)));
            s.max_ms = Some(s.max_ms.map_or(r.elapsed_ms, |m| m.max(r.elapsed_ms)));
        }
        if s.count > 0 {
            s.mean_ms = Some(s.total_ms / s.count as f64);
        }
        s
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub indexing: Summary,
    pub commit: Summary,
    /// Searches for real terms.
    pub search: Summary,
    /// Searches for the blank term.
    pub match_all: Summary,
}

impl GroupSummary {
    fn of<'a>(records: impl Iterator<Item = &'a TimingRecord> + Clone) -> Self {
        Self {
            indexing: Summary::of(records.clone().filter(|r| r.kind == RecordKind::IndexBatch)),
            commit: Summary::of(records.clone().filter(|r| r.kind == RecordKind::Commit)),
            search: Summary::of(records.clone().filter(|r| r.kind == RecordKind::Search && !r.is_match_all())),
            match_all: Summary::of(records.filter(|r| r.is_match_all())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub labels: BTreeMap<String, GroupSummary>,
    pub groups: BTreeMap<String, GroupSummary>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
