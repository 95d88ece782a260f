//! Benchmark runner.
//!
//! Drives a [`SearchClient`] through one run and appends a [`TimingRecord`]
//! for every measured operation.
//!
//! ```text
//! Idle ──► Indexing ──► Searching ──► Completed
//!   │          │            │
//!   └──────────┴────────────┴──► Failed
//! ```
//!
//! `Idle → Searching` is allowed for runs against an index that is already
//! populated. Any error from the client or the document stream moves the run
//! to `Failed`; records appended before the failure stay in the log.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::client::{QueryParams, SearchClient, MATCH_ALL};
use crate::error::{ConfigError, Error, Operation, Result};
use crate::stats::{StatsLog, TimingRecord};
use crate::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Indexing,
    Searching,
    Completed,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Indexing => write!(f, "indexing"),
            RunState::Searching => write!(f, "searching"),
            RunState::Completed => write!(f, "completed"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Where elapsed times come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingSource {
    /// Engine-reported QTime, falling back to wall clock when absent.
    #[default]
    Engine,
    WallClock,
}

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub timing: TimingSource,
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub batch_size: usize,
    /// Commit after every batch and record the commit's time. Otherwise a
    /// single untimed commit runs at the end.
    pub track_commits: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub label: String,
    pub docs: usize,
    pub batches: usize,
    pub add_total_ms: f64,
    pub commit_total_ms: f64,
}

impl IndexSummary {
    pub fn add_mean_ms(&self) -> Option<f64> {
        (self.batches > 0).then(|| self.add_total_ms / self.batches as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermResult {
    pub term: String,
    /// Mean over the kept repetitions.
    pub elapsed_ms: f64,
    /// Hit count from the first kept repetition.
    pub hits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub label: String,
    pub results: Vec<TermResult>,
    pub total_ms: f64,
}

impl SearchSummary {
    pub fn mean_ms(&self) -> Option<f64> {
        (!self.results.is_empty()).then(|| self.total_ms / self.results.len() as f64)
    }
}

fn check_reps(rep_n: usize, ignore_n: usize) -> Result<(), ConfigError> {
    if rep_n == 0 {
        return Err(ConfigError::Zero("rep_n"));
    }
    if ignore_n >= rep_n {
        return Err(ConfigError::IgnoreNotBelowReps { rep_n, ignore_n });
    }
    Ok(())
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let started = Instant::now();
    let out = f();
    (out, started.elapsed().as_secs_f64() * 1000.0)
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct Runner<C> {
    client: C,
    config: RunnerConfig,
    log: StatsLog,
    state: RunState,
}

impl<C: SearchClient> Runner<C> {
    pub fn new(client: C, log: StatsLog, config: RunnerConfig) -> Self {
        Self { client, config, log, state: RunState::Idle }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn log(&self) -> &StatsLog {
        &self.log
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_parts(self) -> (C, StatsLog) {
        (self.client, self.log)
    }

    fn enter(&mut self, action: &'static str, next: RunState) -> Result<(), ConfigError> {
        let allowed = !matches!(
            (self.state, next),
            (RunState::Failed | RunState::Completed, _) | (RunState::Searching, RunState::Indexing)
        );
        if !allowed {
            return Err(ConfigError::InvalidState { action, state: self.state });
        }
        self.state = next;
        Ok(())
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "run failed");
            self.state = RunState::Failed;
        }
        result
    }

    fn elapsed(&self, engine_ms: Option<f64>, wall_ms: f64) -> f64 {
        match self.config.timing {
            TimingSource::Engine => engine_ms.unwrap_or(wall_ms),
            TimingSource::WallClock => wall_ms,
        }
    }

    /// Delete every document from the engine.
    pub fn clear_index(&mut self) -> Result<()> {
        self.enter("clear the index", RunState::Indexing)?;
        let result = self
            .client
            .delete(MATCH_ALL, true)
            .map(drop)
            .map_err(|e| Error::client(Operation::Delete, None, None, e));
        self.guard(result)
    }

    /// Send `docs` in batches of `opts.batch_size`, timing every add (and
    /// every commit when tracked).
    pub fn index_docs<I>(&mut self, docs: I, opts: &IndexOptions) -> Result<IndexSummary>
    where
        I: IntoIterator<Item = Result<Document>>,
    {
        if opts.batch_size == 0 {
            return Err(ConfigError::Zero("batch_size").into());
        }
        self.enter("index documents", RunState::Indexing)?;
        let result = self.index_batches(docs.into_iter(), opts);
        self.guard(result)
    }

    fn index_batches<I>(&mut self, mut docs: I, opts: &IndexOptions) -> Result<IndexSummary>
    where
        I: Iterator<Item = Result<Document>>,
    {
        let label = opts.label.as_str();
        let mut summary = IndexSummary {
            label: label.to_string(),
            docs: 0,
            batches: 0,
            add_total_ms: 0.0,
            commit_total_ms: 0.0,
        };
        let mut batch = Vec::with_capacity(opts.batch_size);

        loop {
            batch.clear();
            for doc in docs.by_ref().take(opts.batch_size) {
                batch.push(doc?);
            }
            if batch.is_empty() {
                break;
            }

            let (resp, wall) = timed(|| self.client.add(&batch, false));
            let resp = resp.map_err(|e| Error::client(Operation::Add, Some(label), None, e))?;
            let elapsed = self.elapsed(resp.qtime_ms, wall);
            self.log.append(TimingRecord::index_batch(label, elapsed, batch.len()));
            summary.docs += batch.len();
            summary.batches += 1;
            summary.add_total_ms += elapsed;
            tracing::info!(label, batch = summary.batches, docs = batch.len(), elapsed_ms = elapsed, "batch added");

            if opts.track_commits {
                let (resp, wall) = timed(|| self.client.commit());
                let resp = resp.map_err(|e| Error::client(Operation::Commit, Some(label), None, e))?;
                let elapsed = self.elapsed(resp.qtime_ms, wall);
                self.log.append(TimingRecord::commit(label, elapsed));
                summary.commit_total_ms += elapsed;
                tracing::info!(label, batch = summary.batches, elapsed_ms = elapsed, "batch committed");
            }
        }

        if !opts.track_commits && summary.batches > 0 {
            self.client
                .commit()
                .map_err(|e| Error::client(Operation::Commit, Some(label), None, e))?;
        }
        Ok(summary)
    }

    /// Query each term `rep_n` times and record the mean of the repetitions
    /// after the first `ignore_n`. A blank term queries for all documents.
    pub fn run_searches<S: AsRef<str>>(
        &mut self,
        terms: &[S],
        label: &str,
        rep_n: usize,
        ignore_n: usize,
        params: &QueryParams,
    ) -> Result<SearchSummary> {
        check_reps(rep_n, ignore_n)?;
        self.enter("run searches", RunState::Searching)?;

        let mut summary = SearchSummary { label: label.to_string(), results: Vec::with_capacity(terms.len()), total_ms: 0.0 };
        for term in terms {
            let result = self.search_term(term.as_ref(), label, rep_n, ignore_n, params);
            let result = self.guard(result)?;
            summary.total_ms += result.elapsed_ms;
            summary.results.push(result);
        }
        tracing::info!(label, terms = terms.len(), total_ms = summary.total_ms, "searches done");
        Ok(summary)
    }

    /// Single-term form of [`Runner::run_searches`].
    pub fn search(
        &mut self,
        term: &str,
        label: &str,
        rep_n: usize,
        ignore_n: usize,
        params: &QueryParams,
    ) -> Result<TermResult> {
        check_reps(rep_n, ignore_n)?;
        self.enter("run searches", RunState::Searching)?;
        let result = self.search_term(term, label, rep_n, ignore_n, params);
        self.guard(result)
    }

    fn search_term(
        &mut self,
        term: &str,
        label: &str,
        rep_n: usize,
        ignore_n: usize,
        params: &QueryParams,
    ) -> Result<TermResult> {
        let query = if term.trim().is_empty() { MATCH_ALL } else { term };
        let mut kept_ms = 0.0;
        let mut hits = None;

        for rep in 0..rep_n {
            let (resp, wall) = timed(|| self.client.search(query, params));
            let resp = resp.map_err(|e| Error::client(Operation::Search, Some(label), Some(term), e))?;
            let elapsed = self.elapsed(resp.qtime_ms, wall);
            tracing::debug!(label, term, rep, elapsed_ms = elapsed, hits = resp.hits, "query");
            if rep >= ignore_n {
                kept_ms += elapsed;
                hits.get_or_insert(resp.hits);
            }
        }

        let kept = rep_n - ignore_n;
        let elapsed_ms = kept_ms / kept as f64;
        let hits = hits.unwrap_or_default();
        self.log.append(TimingRecord::search(label, term, elapsed_ms, kept, hits));
        Ok(TermResult { term: term.to_string(), elapsed_ms, hits })
    }

    /// Mark the run complete. The log is read-only from here on.
    pub fn finish(&mut self) -> Result<(), ConfigError> {
        self.enter("finish", RunState::Completed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
