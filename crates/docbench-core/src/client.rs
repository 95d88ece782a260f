//! Search client contract.
//!
//! The runner talks to an engine only through [`SearchClient`]. Anything
//! that can add, commit, search and delete can stand in, including the
//! in-memory [`MemoryClient`] used by the CLI demo and the tests.

use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;
use serde_json::Value;

use crate::error::ClientError;
use crate::types::Document;

/// Query that matches every document.
pub const MATCH_ALL: &str = "*:*";

static QTIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"QTime\D+(\d+)").expect("static regex"));

/// Pull an engine-reported `QTime` (milliseconds) out of a raw response body.
pub fn scrape_qtime(raw: &str) -> Option<f64> {
    QTIME
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(|ms| ms as f64)
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResponse {
    pub qtime_ms: Option<f64>,
    pub raw: Option<String>,
}

impl UpdateResponse {
    /// Wrap a raw response body, scraping its `QTime` if present.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self { qtime_ms: scrape_qtime(&raw), raw: Some(raw) }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub hits: u64,
    pub qtime_ms: Option<f64>,
}

/// Extra query parameters, passed through to the engine verbatim. Keys may
/// repeat (`fq`, `facet.field`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub trait SearchClient {
    fn add(&mut self, docs: &[Document], commit: bool) -> Result<UpdateResponse, ClientError>;

    fn commit(&mut self) -> Result<UpdateResponse, ClientError>;

    fn search(&mut self, query: &str, params: &QueryParams) -> Result<SearchResponse, ClientError>;

    fn delete(&mut self, query: &str, commit: bool) -> Result<UpdateResponse, ClientError>;
}

impl<C: SearchClient + ?Sized> SearchClient for &mut C {
    fn add(&mut self, docs: &[Document], commit: bool) -> Result<UpdateResponse, ClientError> {
        (**self).add(docs, commit)
    }

    fn commit(&mut self) -> Result<UpdateResponse, ClientError> {
        (**self).commit()
    }

    fn search(&mut self, query: &str, params: &QueryParams) -> Result<SearchResponse, ClientError> {
        (**self).search(query, params)
    }

    fn delete(&mut self, query: &str, commit: bool) -> Result<UpdateResponse, ClientError> {
        (**self).delete(query, commit)
    }
}

// ---------------------------------------------------------------------------
// MemoryClient
// ---------------------------------------------------------------------------

/// A naive in-process index.
///
/// A query matches documents where any string value contains it,
/// case-insensitively. `fq=field:value` filters by exact value. Added
/// documents become searchable on commit.
#[derive(Debug, Default)]
pub struct MemoryClient {
    committed: Vec<Document>,
    pending: Vec<Document>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    fn flush(&mut self) {
        self.committed.append(&mut self.pending);
    }

    fn header(started: Instant) -> UpdateResponse {
        let ms = started.elapsed().as_millis();
        UpdateResponse::from_raw(format!(r#"{{"responseHeader":{{"status":0,"QTime":{ms}}}}}"#))
    }
}

impl SearchClient for MemoryClient {
    fn add(&mut self, docs: &[Document], commit: bool) -> Result<UpdateResponse, ClientError> {
        let started = Instant::now();
        self.pending.extend_from_slice(docs);
        if commit {
            self.flush();
        }
        Ok(Self::header(started))
    }

    fn commit(&mut self) -> Result<UpdateResponse, ClientError> {
        let started = Instant::now();
        self.flush();
        Ok(Self::header(started))
    }

    fn search(&mut self, query: &str, params: &QueryParams) -> Result<SearchResponse, ClientError> {
        let started = Instant::now();
        let filters: Vec<(&str, &str)> = params
            .all("fq")
            .map(|fq| fq.split_once(':').ok_or_else(|| ClientError::Malformed(format!("bad filter {fq:?}"))))
            .collect::<Result<_, _>>()?;
        let matcher = Matcher::parse(query);

        let hits = self
            .committed
            .iter()
            .filter(|doc| matcher.matches(doc))
            .filter(|doc| filters.iter().all(|(field, value)| has_exact(doc, field, value)))
            .count() as u64;

        Ok(SearchResponse { hits, qtime_ms: Some(started.elapsed().as_secs_f64() * 1000.0) })
    }

    fn delete(&mut self, query: &str, commit: bool) -> Result<UpdateResponse, ClientError> {
        let started = Instant::now();
        let matcher = Matcher::parse(query);
        self.committed.retain(|doc| !matcher.matches(doc));
        self.pending.retain(|doc| !matcher.matches(doc));
        if commit {
            self.flush();
        }
        Ok(Self::header(started))
    }
}

enum Matcher {
    All,
    Field(String, String),
    Text(String),
}

impl Matcher {
    fn parse(query: &str) -> Self {
        let query = query.trim();
        if query == MATCH_ALL || query.is_empty() {
            return Matcher::All;
        }
        match query.split_once(':') {
            Some((field, value)) if !field.contains(' ') => Matcher::Field(field.to_string(), value.to_string()),
            _ => Matcher::Text(query.to_lowercase()),
        }
    }

    fn matches(&self, doc: &Document) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Field(field, value) => has_exact(doc, field, value),
            Matcher::Text(needle) => doc.iter().any(|(_, v)| contains_text(v, needle)),
        }
    }
}

fn has_exact(doc: &Document, field: &str, value: &str) -> bool {
    doc.strings(field).contains(&value)
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|v| contains_text(v, needle)),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
