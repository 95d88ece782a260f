//! Document-set production, persistence and restore.
//!
//! [`Producer`] realises a [`ConfiguredSchema`] one document at a time,
//! optionally streaming each document to a [`FileSet`] as it goes. A
//! [`DocReader`] replays a persisted set without touching any emitter.
//! [`DocSet`] ties the two together: the first pass generates and persists,
//! later passes replay.
//!
//! # On-disk layout
//!
//! ```text
//! {dir}/{id}_terms.json    search terms and facet vocabularies
//! {dir}/{id}_docs.jsonl    one JSON document per line, in slot order
//! {dir}/{id}_counts.json   total_docs and facet value counts
//! ```
//!
//! The counts file is written last, so its presence marks a complete set.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PersistError, Result};
use crate::schema::ConfiguredSchema;
use crate::terms::Vocabulary;
use crate::types::Document;

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    Overwrite,
    Append,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsSnapshot {
    pub search_terms: Vocabulary,
    pub facet_terms: BTreeMap<String, Vocabulary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Document total plus per-facet value counts, most common value first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountsSnapshot {
    pub total_docs: usize,
    pub facet_value_counts: BTreeMap<String, Vec<ValueCount>>,
}

impl CountsSnapshot {
    /// Add `other` on top of `self`. Ties keep first-seen order.
    pub fn merge(self, other: CountsSnapshot) -> CountsSnapshot {
        let mut fields = self.facet_value_counts;
        for (field, counts) in other.facet_value_counts {
            let merged = fields.entry(field).or_default();
            let mut index: HashMap<String, usize> =
                merged.iter().enumerate().map(|(i, vc)| (vc.value.clone(), i)).collect();
            for vc in counts {
                match index.get(&vc.value) {
                    Some(&i) => merged[i].count += vc.count,
                    None => {
                        index.insert(vc.value.clone(), merged.len());
                        merged.push(vc);
                    }
                }
            }
            merged.sort_by(|a, b| b.count.cmp(&a.count));
        }
        CountsSnapshot { total_docs: self.total_docs + other.total_docs, facet_value_counts: fields }
    }

    pub fn count_of(&self, field: &str, value: &str) -> usize {
        self.facet_value_counts
            .get(field)
            .and_then(|counts| counts.iter().find(|vc| vc.value == value))
            .map_or(0, |vc| vc.count)
    }
}

/// Running facet value counts over a stream of documents.
#[derive(Debug, Clone, Default)]
pub struct FacetTally {
    total: usize,
    fields: Vec<(String, Vec<ValueCount>, HashMap<String, usize>)>,
}

impl FacetTally {
    pub fn new<S: Into<String>>(facet_fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            total: 0,
            fields: facet_fields.into_iter().map(|f| (f.into(), Vec::new(), HashMap::new())).collect(),
        }
    }

    pub fn observe(&mut self, doc: &Document) {
        self.total += 1;
        for (field, counts, index) in &mut self.fields {
            for value in doc.strings(field) {
                match index.get(value) {
                    Some(&i) => counts[i].count += 1,
                    None => {
                        index.insert(value.to_string(), counts.len());
                        counts.push(ValueCount { value: value.to_string(), count: 1 });
                    }
                }
            }
        }
    }

    pub fn snapshot(&self) -> CountsSnapshot {
        let facet_value_counts = self
            .fields
            .iter()
            .map(|(field, counts, _)| {
                let mut sorted = counts.clone();
                sorted.sort_by(|a, b| b.count.cmp(&a.count));
                (field.clone(), sorted)
            })
            .collect();
        CountsSnapshot { total_docs: self.total, facet_value_counts }
    }
}

// ---------------------------------------------------------------------------
// FileSet
// ---------------------------------------------------------------------------

/// The files backing one persisted document set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    dir: PathBuf,
    id: String,
}

impl FileSet {
    pub fn new(dir: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self { dir: dir.into(), id: id.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn terms_path(&self) -> PathBuf {
        self.dir.join(format!("{}_terms.json", self.id))
    }

    pub fn docs_path(&self) -> PathBuf {
        self.dir.join(format!("{}_docs.jsonl", self.id))
    }

    pub fn counts_path(&self) -> PathBuf {
        self.dir.join(format!("{}_counts.json", self.id))
    }

    /// Whether a full pass has been persisted.
    pub fn is_complete(&self) -> bool {
        self.docs_path().is_file() && self.counts_path().is_file()
    }

    pub fn save_terms(&self, terms: &TermsSnapshot) -> Result<(), PersistError> {
        write_json(&self.terms_path(), terms)
    }

    pub fn load_terms(&self) -> Result<TermsSnapshot, PersistError> {
        read_json(&self.terms_path())
    }

    pub fn save_counts(&self, counts: &CountsSnapshot) -> Result<(), PersistError> {
        write_json(&self.counts_path(), counts)
    }

    pub fn load_counts(&self) -> Result<CountsSnapshot, PersistError> {
        read_json(&self.counts_path())
    }

    /// Open the documents file. Any counts file is removed first, since it
    /// would no longer describe the documents.
    pub fn writer(&self, mode: WriteMode) -> Result<DocWriter, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistError::io(&self.dir, e))?;
        remove_if_exists(&self.counts_path())?;

        let path = self.docs_path();
        let file = match mode {
            WriteMode::Overwrite => File::create(&path),
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(&path),
        }
        .map_err(|e| PersistError::io(&path, e))?;

        Ok(DocWriter { path, out: BufWriter::new(file), written: 0 })
    }

    /// Replay the persisted documents. Fails if the set is incomplete.
    pub fn reader(&self) -> Result<DocReader, PersistError> {
        if !self.is_complete() {
            return Err(PersistError::Missing { dir: self.dir.clone(), id: self.id.clone() });
        }
        let expected = self.load_counts()?.total_docs;
        let path = self.docs_path();
        let file = File::open(&path).map_err(|e| PersistError::io(&path, e))?;
        Ok(DocReader { path, lines: BufReader::new(file).lines(), expected, read: 0, line: 0, done: false })
    }

    /// Delete all three files. Missing files are not an error.
    pub fn clear(&self) -> Result<(), PersistError> {
        for path in [self.terms_path(), self.docs_path(), self.counts_path()] {
            remove_if_exists(&path)?;
        }
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<(), PersistError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(PersistError::io(path, e)),
        _ => Ok(()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| PersistError::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| PersistError::json(path, e))?;
    out.flush().map_err(|e| PersistError::io(path, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let file = File::open(path).map_err(|e| PersistError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| PersistError::json(path, e))
}

/// Streaming JSON Lines writer.
pub struct DocWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl DocWriter {
    pub fn write(&mut self, doc: &Document) -> Result<(), PersistError> {
        serde_json::to_writer(&mut self.out, doc).map_err(|e| PersistError::json(&self.path, e))?;
        self.out.write_all(b"\n").map_err(|e| PersistError::io(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<usize, PersistError> {
        self.out.flush().map_err(|e| PersistError::io(&self.path, e))?;
        Ok(self.written)
    }
}

/// Replays a persisted document set line by line.
///
/// Stops at the first corrupt line. Reports a [`PersistError::Truncated`]
/// if the number of documents read does not match the counts snapshot.
pub struct DocReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    expected: usize,
    read: usize,
    line: usize,
    done: bool,
}

impl DocReader {
    pub fn expected(&self) -> usize {
        self.expected
    }
}

impl Iterator for DocReader {
    type Item = Result<Document, PersistError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.line += 1;
            match self.lines.next() {
                Some(Ok(text)) if text.trim().is_empty() => continue,
                Some(Ok(text)) => {
                    self.read += 1;
                    return Some(serde_json::from_str(&text).map_err(|source| {
                        self.done = true;
                        PersistError::Corrupt { path: self.path.clone(), line: self.line, source }
                    }));
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(PersistError::io(&self.path, e)));
                }
                None => {
                    self.done = true;
                    if self.read != self.expected {
                        return Some(Err(PersistError::Truncated {
                            path: self.path.clone(),
                            expected: self.expected,
                            found: self.read,
                        }));
                    }
                    return None;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

struct Sink {
    fileset: FileSet,
    writer: DocWriter,
    base: Option<CountsSnapshot>,
}

/// Lazily realises every document of a configured schema, in slot order.
///
/// When persisting, each document is written before it is handed out, and
/// the counts snapshot is written once the last document has been produced.
/// An appending producer continues slot numbering after the documents
/// already on disk, so appended documents never repeat earlier ones.
pub struct Producer<'a> {
    schema: &'a ConfiguredSchema,
    start: usize,
    next: usize,
    tally: FacetTally,
    sink: Option<Sink>,
    done: bool,
}

impl<'a> Producer<'a> {
    pub fn new(schema: &'a ConfiguredSchema) -> Self {
        Self {
            schema,
            start: 0,
            next: 0,
            tally: FacetTally::new(schema.facet_field_names()),
            sink: None,
            done: false,
        }
    }

    pub fn persisting(schema: &'a ConfiguredSchema, fileset: &FileSet, mode: WriteMode) -> Result<Self, PersistError> {
        let base = match mode {
            WriteMode::Append if fileset.counts_path().is_file() => Some(fileset.load_counts()?),
            _ => None,
        };
        let start = base.as_ref().map_or(0, |b| b.total_docs);
        let writer = fileset.writer(mode)?;
        tracing::debug!(path = ?writer.path, ?mode, start, "streaming documents to disk");
        Ok(Self { start, next: start, sink: Some(Sink { fileset: fileset.clone(), writer, base }), ..Self::new(schema) })
    }

    pub fn produced(&self) -> usize {
        self.next - self.start
    }

    fn end(&self) -> usize {
        self.start + self.schema.num_docs()
    }

    /// Facet counts over the documents produced so far.
    pub fn counts(&self) -> CountsSnapshot {
        self.tally.snapshot()
    }

    fn finish(&mut self) -> Result<(), PersistError> {
        let Some(sink) = self.sink.take() else {
            return Ok(());
        };
        let written = sink.writer.finish()?;
        let counts = match sink.base {
            Some(base) => base.merge(self.tally.snapshot()),
            None => self.tally.snapshot(),
        };
        sink.fileset.save_counts(&counts)?;
        tracing::info!(id = sink.fileset.id(), written, total_docs = counts.total_docs, "document set persisted");
        Ok(())
    }
}

impl Iterator for Producer<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.next >= self.end() {
            self.done = true;
            return self.finish().err().map(|e| Err(e.into()));
        }

        let doc = self.schema.build(self.next);
        self.next += 1;
        self.tally.observe(&doc);
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.writer.write(&doc) {
                self.done = true;
                self.sink = None;
                return Some(Err(e.into()));
            }
        }
        Some(Ok(doc))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end().saturating_sub(self.next);
        (left, Some(left + 1))
    }
}

/// Lazy sequence of every document in `schema`.
pub fn produce(schema: &ConfiguredSchema) -> Producer<'_> {
    Producer::new(schema)
}

/// Write an arbitrary document sequence to `fileset`, counting values of
/// `facet_fields`. Returns the number of documents written.
pub fn persist<I>(docs: I, fileset: &FileSet, mode: WriteMode, facet_fields: &[&str]) -> Result<usize>
where
    I: IntoIterator<Item = Result<Document>>,
{
    let base = match mode {
        WriteMode::Append if fileset.counts_path().is_file() => Some(fileset.load_counts()?),
        _ => None,
    };
    let mut writer = fileset.writer(mode)?;
    let mut tally = FacetTally::new(facet_fields.iter().copied());
    for doc in docs {
        let doc = doc?;
        tally.observe(&doc);
        writer.write(&doc)?;
    }
    let written = writer.finish()?;
    let counts = match base {
        Some(base) => base.merge(tally.snapshot()),
        None => tally.snapshot(),
    };
    fileset.save_counts(&counts)?;
    Ok(written)
}

/// Replay a persisted document set.
pub fn restore(fileset: &FileSet) -> Result<DocReader, PersistError> {
    fileset.reader()
}

// ---------------------------------------------------------------------------
// DocSet
// ---------------------------------------------------------------------------

/// A named document set that generates once and replays afterwards.
pub struct DocSet {
    id: String,
    schema: Option<ConfiguredSchema>,
    fileset: Option<FileSet>,
    pending: Option<WriteMode>,
    terms: TermsSnapshot,
}

/// One pass over a [`DocSet`]: either freshly generated or replayed.
pub enum DocStream<'a> {
    Fresh(Producer<'a>),
    Replay(DocReader),
}

impl DocStream<'_> {
    pub fn is_replay(&self) -> bool {
        matches!(self, DocStream::Replay(_))
    }
}

impl Iterator for DocStream<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            DocStream::Fresh(producer) => producer.next(),
            DocStream::Replay(reader) => reader.next().map(|r| r.map_err(Into::into)),
        }
    }
}

impl DocSet {
    /// A document set backed by `schema`. With a `savepath`, the first pass
    /// overwrites any set persisted under the same id there.
    pub fn from_schema(id: impl Into<String>, schema: ConfiguredSchema, savepath: Option<PathBuf>) -> Result<Self> {
        let id = id.into();
        let terms = TermsSnapshot { search_terms: schema.search_terms().clone(), facet_terms: schema.facet_terms() };
        let fileset = savepath.map(|dir| FileSet::new(dir, id.clone()));
        if let Some(fileset) = &fileset {
            fileset.save_terms(&terms)?;
        }
        let pending = fileset.as_ref().map(|_| WriteMode::Overwrite);
        Ok(Self { id, schema: Some(schema), fileset, pending, terms })
    }

    /// A document set previously persisted under `dir`.
    pub fn from_disk(id: impl Into<String>, dir: impl Into<PathBuf>) -> Result<Self> {
        let fileset = FileSet::new(dir, id);
        if !fileset.is_complete() {
            return Err(PersistError::Missing { dir: fileset.dir.clone(), id: fileset.id.clone() }.into());
        }
        let terms = fileset.load_terms()?;
        Ok(Self { id: fileset.id.clone(), schema: None, fileset: Some(fileset), pending: None, terms })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn terms(&self) -> &TermsSnapshot {
        &self.terms
    }

    pub fn search_terms(&self) -> &Vocabulary {
        &self.terms.search_terms
    }

    pub fn fileset(&self) -> Option<&FileSet> {
        self.fileset.as_ref()
    }

    /// Persisted counts, if a complete pass is on disk.
    pub fn counts(&self) -> Result<Option<CountsSnapshot>, PersistError> {
        match &self.fileset {
            Some(fs) if fs.is_complete() => fs.load_counts().map(Some),
            _ => Ok(None),
        }
    }

    /// Make the next pass regenerate from the schema, overwriting or
    /// appending to the persisted documents.
    pub fn regenerate(&mut self, mode: WriteMode) -> Result<(), ConfigError> {
        if self.schema.is_none() {
            return Err(ConfigError::NoSchema(self.id.clone()));
        }
        if self.fileset.is_some() {
            self.pending = Some(mode);
        }
        Ok(())
    }

    /// Start a pass over the documents.
    pub fn docs(&mut self) -> Result<DocStream<'_>> {
        let pending = self.pending.take();
        let Some(fileset) = &self.fileset else {
            return match &self.schema {
                Some(schema) => Ok(DocStream::Fresh(Producer::new(schema))),
                None => Err(ConfigError::NoSchema(self.id.clone()).into()),
            };
        };

        // An interrupted pass leaves no counts file; start over, even when an
        // append was requested.
        let mode = match pending {
            _ if !fileset.is_complete() => Some(WriteMode::Overwrite),
            pending => pending,
        };
        match (mode, &self.schema) {
            (None, _) => Ok(DocStream::Replay(fileset.reader()?)),
            (Some(mode), Some(schema)) => {
                if mode == WriteMode::Overwrite && fileset.docs_path().is_file() {
                    tracing::warn!(id = %self.id, "replacing persisted documents");
                }
                Ok(DocStream::Fresh(Producer::persisting(schema, fileset, mode)?))
            }
            (Some(_), None) => Err(PersistError::Missing { dir: fileset.dir.clone(), id: self.id.clone() }.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
