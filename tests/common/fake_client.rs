//! A scripted [`SearchClient`] that records every call.
//!
//! Search timings are replayed from a queue so tests can assert exact means;
//! failures can be injected on the n-th call of an operation.

use std::collections::VecDeque;

use docbench_core::client::{QueryParams, SearchClient, SearchResponse, UpdateResponse};
use docbench_core::{ClientError, Document};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Add(usize),
    Commit,
    Search(String),
    Delete(String),
}

#[derive(Debug, Default)]
pub struct ScriptedClient {
    pub calls: Vec<Call>,
    search_qtimes: VecDeque<f64>,
    default_qtime: Option<f64>,
    hits: u64,
    fail_add_at: Option<usize>,
    fail_search_at: Option<usize>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self { default_qtime: Some(1.0), ..Self::default() }
    }

    /// Engine-reported times for successive searches, in order.
    pub fn search_qtimes(mut self, times: impl IntoIterator<Item = f64>) -> Self {
        self.search_qtimes = times.into_iter().collect();
        self
    }

    /// Stop reporting QTime once the scripted times run out.
    pub fn without_default_qtime(mut self) -> Self {
        self.default_qtime = None;
        self
    }

    pub fn hits(mut self, hits: u64) -> Self {
        self.hits = hits;
        self
    }

    /// Fail the n-th add call (1-based).
    pub fn fail_add_at(mut self, n: usize) -> Self {
        self.fail_add_at = Some(n);
        self
    }

    /// Fail the n-th search call (1-based).
    pub fn fail_search_at(mut self, n: usize) -> Self {
        self.fail_search_at = Some(n);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Search(_))).count()
    }

    pub fn add_calls(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Add(_))).count()
    }

    pub fn commit_calls(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Commit)).count()
    }
}

impl SearchClient for ScriptedClient {
    fn add(&mut self, docs: &[Document], commit: bool) -> Result<UpdateResponse, ClientError> {
        self.calls.push(Call::Add(docs.len()));
        if Some(self.add_calls()) == self.fail_add_at {
            return Err(ClientError::Engine { status: 500, message: "add rejected".into() });
        }
        if commit {
            self.calls.push(Call::Commit);
        }
        Ok(UpdateResponse { qtime_ms: Some(3.0), raw: None })
    }

    fn commit(&mut self) -> Result<UpdateResponse, ClientError> {
        self.calls.push(Call::Commit);
        Ok(UpdateResponse { qtime_ms: Some(2.0), raw: None })
    }

    fn search(&mut self, query: &str, _params: &QueryParams) -> Result<SearchResponse, ClientError> {
        self.calls.push(Call::Search(query.to_string()));
        if Some(self.search_calls()) == self.fail_search_at {
            return Err(ClientError::Transport("connection reset".into()));
        }
        let qtime_ms = self.search_qtimes.pop_front().or(self.default_qtime);
        Ok(SearchResponse { hits: self.hits, qtime_ms })
    }

    fn delete(&mut self, query: &str, _commit: bool) -> Result<UpdateResponse, ClientError> {
        self.calls.push(Call::Delete(query.to_string()));
        Ok(UpdateResponse::default())
    }
}
