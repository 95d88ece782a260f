//! Schema definition and field injection.
//!
//! A [`Schema`] is a closed list of fields, each playing one [`FieldRole`]:
//!
//! - **Plain** fields emit values and are left alone.
//! - **SearchInjected** fields emit values that get search terms mixed in.
//! - **FacetSource** fields draw from their own facet vocabulary, which is
//!   always authoritative; other fields may copy from it, never the reverse.
//!
//! Fields can copy an earlier field's value by name. Names are resolved once,
//! in [`SchemaBuilder::build`]. A schema cannot produce documents until it is
//! [`Schema::configure`]d for a target document count, which yields a
//! [`ConfiguredSchema`] whose every document is a pure function of its slot.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde_json::Value;

use crate::emitter::{slot_rng, stream, Emitter, SharedEmitter, SlotRng};
use crate::error::{unit_interval, ConfigError, Result};
use crate::terms::{make_vocabulary, DistributionParams, PerSlot, Skew, TermDistribution, Vocabulary};
use crate::types::Document;

pub type FieldId = usize;

// ---------------------------------------------------------------------------
// Field definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Plain,
    SearchInjected,
    FacetSource,
}

/// Number of distinct values a facet field carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Cardinality {
    Fixed(usize),
    /// `round(max(num_docs * factor, floor))`.
    PerDocs { factor: f64, floor: usize },
}

impl Cardinality {
    pub fn resolve(&self, num_docs: usize) -> Result<usize, ConfigError> {
        let n = match *self {
            Cardinality::Fixed(n) => n,
            Cardinality::PerDocs { factor, floor } => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "cardinality factor must be positive, got {factor}"
                    )));
                }
                (num_docs as f64 * factor).max(floor as f64).round() as usize
            }
        };
        if n == 0 {
            return Err(ConfigError::Zero("facet cardinality"));
        }
        Ok(n)
    }
}

#[derive(Clone)]
enum Source {
    Emit(SharedEmitter<Value>),
    Copy(String),
    Facet { values: SharedEmitter<String>, cardinality: Cardinality },
}

/// One field of a schema, before name resolution.
#[derive(Clone)]
pub struct FieldDef {
    name: String,
    source: Source,
    searchable: bool,
    gate: f64,
    repeat: Option<(usize, usize)>,
    skew: Option<Skew>,
}

impl FieldDef {
    fn new(name: impl Into<String>, source: Source) -> Self {
        Self { name: name.into(), source, searchable: false, gate: 1.0, repeat: None, skew: None }
    }

    pub fn plain<E: Emitter<Value> + 'static>(name: impl Into<String>, emitter: E) -> Self {
        Self::new(name, Source::Emit(Arc::new(emitter)))
    }

    pub fn search<E: Emitter<Value> + 'static>(name: impl Into<String>, emitter: E) -> Self {
        Self::plain(name, emitter).searchable()
    }

    pub fn facet<E: Emitter<String> + 'static>(name: impl Into<String>, values: E, cardinality: Cardinality) -> Self {
        Self::new(name, Source::Facet { values: Arc::new(values), cardinality })
    }

    /// Copy the value of an earlier field.
    pub fn copy_of(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, Source::Copy(target.into()))
    }

    /// Mark this field as a target for search-term injection.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Chance that the field is present in a document.
    pub fn gate(mut self, chance: f64) -> Self {
        self.gate = chance;
        self
    }

    /// Emit between `min` and `max` values as an array.
    pub fn repeat(mut self, min: usize, max: usize) -> Self {
        self.repeat = Some((min, max));
        self
    }

    /// Facet value frequency curve. Defaults to [`Skew::long_tail`].
    pub fn skew(mut self, skew: Skew) -> Self {
        self.skew = Some(skew);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum FieldKind {
    Emit(SharedEmitter<Value>),
    Copy(FieldId),
    Facet { values: SharedEmitter<String>, cardinality: Cardinality, skew: Option<Skew> },
}

#[derive(Clone)]
struct Field {
    name: String,
    kind: FieldKind,
    searchable: bool,
    gate: f64,
    repeat: Option<(usize, usize)>,
}

impl Field {
    fn role(&self) -> FieldRole {
        match (&self.kind, self.searchable) {
            (FieldKind::Facet { .. }, _) => FieldRole::FacetSource,
            (_, true) => FieldRole::SearchInjected,
            (_, false) => FieldRole::Plain,
        }
    }
}

#[derive(Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Resolve copy references and validate every field.
    pub fn build(self) -> Result<Schema, ConfigError> {
        let mut ids: HashMap<String, FieldId> = HashMap::with_capacity(self.fields.len());
        let mut fields = Vec::with_capacity(self.fields.len());

        for (id, def) in self.fields.into_iter().enumerate() {
            if ids.contains_key(&def.name) {
                return Err(ConfigError::DuplicateField(def.name));
            }
            unit_interval("gate", def.gate)?;
            if let Some((min, max)) = def.repeat {
                if min == 0 || min > max {
                    return Err(ConfigError::RepeatRange { min, max });
                }
            }

            let kind = match def.source {
                Source::Emit(emitter) => FieldKind::Emit(emitter),
                Source::Copy(target) => match ids.get(&target) {
                    Some(&src) if def.repeat.is_none() => FieldKind::Copy(src),
                    Some(_) => {
                        return Err(ConfigError::Invalid(format!(
                            "copy field `{}` cannot repeat its source",
                            def.name
                        )))
                    }
                    None => return Err(ConfigError::UnresolvedCopy { field: def.name, target }),
                },
                Source::Facet { values, cardinality } => {
                    if def.searchable {
                        return Err(ConfigError::Invalid(format!(
                            "facet field `{}` cannot receive search terms",
                            def.name
                        )));
                    }
                    FieldKind::Facet { values, cardinality, skew: def.skew.clone() }
                }
            };
            if def.skew.is_some() && !matches!(kind, FieldKind::Facet { .. }) {
                return Err(ConfigError::Invalid(format!("field `{}` sets a skew but is not a facet", def.name)));
            }

            ids.insert(def.name.clone(), id);
            fields.push(Field { name: def.name, kind, searchable: def.searchable, gate: def.gate, repeat: def.repeat });
        }

        Ok(Schema { fields })
    }
}

/// Parameters that finalise a schema for one document set.
#[derive(Debug, Clone)]
pub struct InjectionParams {
    pub num_docs: usize,
    pub search_terms: Vocabulary,
    pub skew: Skew,
    /// Average number of search terms injected per document.
    pub term_doc_ratio: f64,
    pub overwrite_chance: f64,
    pub seed: u64,
}

/// A validated, unconfigured schema.
#[derive(Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn role(&self, name: &str) -> Option<FieldRole> {
        self.fields.iter().find(|f| f.name == name).map(Field::role)
    }

    fn search_fields(&self) -> Vec<FieldId> {
        self.fields.iter().enumerate().filter(|(_, f)| f.searchable).map(|(id, _)| id).collect()
    }

    /// Build the search-term distribution from a term:doc ratio and finalise
    /// the schema.
    pub fn configure(&self, params: InjectionParams) -> Result<ConfiguredSchema> {
        if params.num_docs == 0 {
            return Err(ConfigError::Zero("num_docs").into());
        }
        let search_fields = self.search_fields();
        if search_fields.is_empty() {
            return Err(ConfigError::NoSearchFields.into());
        }

        let ratio = params.term_doc_ratio;
        let max = search_fields.len() as f64;
        if !ratio.is_finite() || ratio <= 0.0 || ratio > max {
            return Err(ConfigError::TermDocRatio { requested: ratio, max }.into());
        }
        let (occurrence, per_slot) = if ratio <= 1.0 {
            (ratio, PerSlot::Fixed(1))
        } else {
            (1.0, PerSlot::Mean(ratio))
        };

        let search = TermDistribution::new(
            params.search_terms.len(),
            &DistributionParams {
                num_docs: params.num_docs,
                occurrence,
                per_slot,
                overwrite_chance: params.overwrite_chance,
                skew: params.skew,
                seed: params.seed,
            },
        )?;
        self.configure_with(params.search_terms, search, params.seed)
    }

    /// Finalise the schema with a caller-built search distribution. The
    /// distribution fixes the document count.
    pub fn configure_with(
        &self,
        search_terms: Vocabulary,
        search: TermDistribution,
        seed: u64,
    ) -> Result<ConfiguredSchema> {
        let search_fields = self.search_fields();
        if search_fields.is_empty() {
            return Err(ConfigError::NoSearchFields.into());
        }
        if search.vocab_len() != search_terms.len() {
            return Err(ConfigError::Invalid(format!(
                "distribution spans {} terms but the vocabulary holds {}",
                search.vocab_len(),
                search_terms.len()
            ))
            .into());
        }
        let num_docs = search.num_docs();

        let mut facets = Vec::new();
        let mut facet_index = vec![None; self.fields.len()];
        for (id, field) in self.fields.iter().enumerate() {
            let FieldKind::Facet { values, cardinality, skew } = &field.kind else {
                continue;
            };
            let facet_seed = seed.wrapping_add(stream::FACET_BASE + id as u64);
            let n = cardinality.resolve(num_docs)?;
            if let Some((_, max)) = field.repeat.filter(|&(_, max)| max > n) {
                return Err(ConfigError::RepeatAboveCardinality { field: field.name.clone(), max, cardinality: n }.into());
            }

            let mut items: Vec<String> = make_vocabulary(&**values, n, facet_seed)?.into();
            // Facet frequency must not follow term length.
            items.shuffle(&mut slot_rng(facet_seed, stream::PERMUTATION, 1));
            let vocab = Vocabulary::new(items)?;

            let dist = TermDistribution::new(
                n,
                &DistributionParams {
                    num_docs,
                    occurrence: field.gate,
                    per_slot: match field.repeat {
                        Some((min, max)) => PerSlot::Range { min, max },
                        None => PerSlot::Fixed(1),
                    },
                    overwrite_chance: 0.0,
                    skew: skew.clone().unwrap_or_else(|| Skew::long_tail(n)),
                    seed: facet_seed,
                },
            )?;
            tracing::debug!(field = %field.name, cardinality = n, "facet configured");
            facet_index[id] = Some(facets.len());
            facets.push(Facet { vocab, dist });
        }

        tracing::info!(
            num_docs,
            search_terms = search_terms.len(),
            search_fields = search_fields.len(),
            facets = facets.len(),
            "schema configured"
        );

        Ok(ConfiguredSchema {
            fields: self.fields.clone(),
            facets,
            facet_index,
            search_fields,
            search_terms,
            search,
            num_docs,
            seed,
        })
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter().map(|field| (&field.name, field.role()))).finish()
    }
}

// ---------------------------------------------------------------------------
// Configured schema
// ---------------------------------------------------------------------------

struct Facet {
    vocab: Vocabulary,
    dist: TermDistribution,
}

/// A schema finalised for `num_docs` slots.
pub struct ConfiguredSchema {
    fields: Vec<Field>,
    facets: Vec<Facet>,
    facet_index: Vec<Option<usize>>,
    search_fields: Vec<FieldId>,
    search_terms: Vocabulary,
    search: TermDistribution,
    num_docs: usize,
    seed: u64,
}

impl ConfiguredSchema {
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn search_terms(&self) -> &Vocabulary {
        &self.search_terms
    }

    pub fn search_distribution(&self) -> &TermDistribution {
        &self.search
    }

    pub fn search_field_names(&self) -> Vec<&str> {
        self.search_fields.iter().map(|&id| self.fields[id].name.as_str()).collect()
    }

    pub fn facet_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .zip(&self.facet_index)
            .filter(|(_, idx)| idx.is_some())
            .map(|(f, _)| f.name.as_str())
            .collect()
    }

    /// Facet vocabularies keyed by field name.
    pub fn facet_terms(&self) -> BTreeMap<String, Vocabulary> {
        self.fields
            .iter()
            .zip(&self.facet_index)
            .filter_map(|(f, idx)| idx.map(|i| (f.name.clone(), self.facets[i].vocab.clone())))
            .collect()
    }

    /// The document for `slot` (0-based).
    pub fn document(&self, slot: usize) -> Result<Document, ConfigError> {
        if slot >= self.num_docs {
            return Err(ConfigError::SlotOutOfRange { slot, num_docs: self.num_docs });
        }
        Ok(self.build(slot))
    }

    /// Every document, in slot order.
    pub fn documents(&self) -> impl ExactSizeIterator<Item = Document> + '_ {
        (0..self.num_docs).map(|slot| self.build(slot))
    }

    pub(crate) fn build(&self, slot: usize) -> Document {
        let mut values: Vec<Option<Value>> = Vec::with_capacity(self.fields.len());

        for (id, field) in self.fields.iter().enumerate() {
            let mut rng = slot_rng(self.seed, stream::FIELD_BASE + id as u64, slot as u64);
            let value = match &field.kind {
                FieldKind::Emit(emitter) => rng
                    .random_bool(field.gate)
                    .then(|| emit_value(&**emitter, field.repeat, slot, &mut rng)),
                FieldKind::Copy(src) => match &values[*src] {
                    Some(v) if rng.random_bool(field.gate) => Some(v.clone()),
                    _ => None,
                },
                FieldKind::Facet { .. } => self.facet_index[id]
                    .and_then(|i| self.facet_value(&self.facets[i], slot, field.repeat.is_some())),
            };
            values.push(value);
        }

        self.inject(slot, &mut values);

        self.fields
            .iter()
            .zip(values)
            .filter_map(|(field, value)| value.map(|v| (field.name.clone(), v)))
            .collect()
    }

    fn facet_value(&self, facet: &Facet, slot: usize, multi: bool) -> Option<Value> {
        let assignment = facet.dist.assign(slot);
        let mut items: Vec<Value> = assignment
            .items()
            .filter_map(|i| facet.vocab.get(i))
            .map(Value::from)
            .collect();
        match items.len() {
            0 => None,
            1 if !multi => items.pop(),
            _ => Some(Value::Array(items)),
        }
    }

    /// Route this slot's search terms into its search fields: fields that
    /// already hold a value first, then absent ones, which are created.
    fn inject(&self, slot: usize, values: &mut [Option<Value>]) {
        let assignment = self.search.assign(slot);
        if assignment.is_empty() {
            return;
        }

        let mut rng = slot_rng(self.seed, stream::ROUTING, slot as u64);
        let (mut present, absent): (Vec<FieldId>, Vec<FieldId>) =
            self.search_fields.iter().copied().partition(|&f| values[f].is_some());
        present.shuffle(&mut rng);
        let order: Vec<FieldId> = present.into_iter().chain(absent).collect();

        for (j, placement) in assignment.placements.iter().enumerate() {
            let Some(term) = self.search_terms.get(placement.item) else {
                continue;
            };
            let field = order[j % order.len()];
            let first_visit = j < order.len();
            let multi = self.fields[field].repeat.is_some();

            values[field] = Some(match values[field].take() {
                None if multi => Value::Array(vec![Value::from(term)]),
                None => Value::from(term),
                Some(existing) => inject_term(existing, term, placement.overwrite && first_visit, &mut rng),
            });
        }
    }
}

impl fmt::Debug for ConfiguredSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredSchema")
            .field("fields", &self.fields.iter().map(|f| &f.name).collect::<Vec<_>>())
            .field("num_docs", &self.num_docs)
            .field("search_terms", &self.search_terms.len())
            .field("seed", &self.seed)
            .finish()
    }
}

fn emit_value(emitter: &dyn Emitter<Value>, repeat: Option<(usize, usize)>, slot: usize, rng: &mut SlotRng) -> Value {
    match repeat {
        None => emitter.emit(slot, rng),
        Some((min, max)) => {
            let n = rng.random_range(min..=max);
            Value::Array((0..n).map(|_| emitter.emit(slot, rng)).collect())
        }
    }
}

/// Mix `term` into an existing value. Overwriting replaces the whole string
/// (or one element of an array); otherwise the term is inserted at a random
/// word boundary.
fn inject_term(value: Value, term: &str, overwrite: bool, rng: &mut SlotRng) -> Value {
    match value {
        Value::String(_) if overwrite => Value::from(term),
        Value::String(text) => Value::String(insert_at_word_boundary(&text, term, rng)),
        Value::Array(mut items) => {
            let candidates: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, v)| v.as_str().is_some_and(|s| !s.is_empty()))
                .map(|(i, _)| i)
                .collect();
            match candidates.choose(rng) {
                Some(&i) => {
                    let item = std::mem::take(&mut items[i]);
                    items[i] = inject_term(item, term, overwrite, rng);
                }
                None => items.push(Value::from(term)),
            }
            Value::Array(items)
        }
        // Non-text values cannot carry a term alongside them.
        _ => Value::from(term),
    }
}

fn insert_at_word_boundary(text: &str, term: &str, rng: &mut SlotRng) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    let at = rng.random_range(0..=words.len());
    words.insert(at, term);
    words.join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{into_value, FnEmitter};
    use crate::error::Error;

    fn text(words: &'static [&'static str]) -> impl Emitter<Value> {
        into_value(FnEmitter(move |_: usize, rng: &mut SlotRng| {
            (0..4).map(|_| *words.choose(rng).unwrap_or(&"x")).collect::<Vec<_>>().join(" ")
        }))
    }

    fn colours() -> impl Emitter<String> {
        FnEmitter(|_: usize, rng: &mut SlotRng| format!("c{}", rng.random_range(0..1_000u32)))
    }

    fn terms(n: usize) -> Vocabulary {
        Vocabulary::new((0..n).map(|i| format!("term{i}")).collect()).unwrap()
    }

    fn params(num_docs: usize, ratio: f64) -> InjectionParams {
        InjectionParams {
            num_docs,
            search_terms: terms(5),
            skew: Skew::Uniform,
            term_doc_ratio: ratio,
            overwrite_chance: 0.0,
            seed: 11,
        }
    }

    const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta"];

    #[test]
    fn copy_must_reference_an_earlier_field() {
        let err = Schema::builder()
            .field(FieldDef::copy_of("title_copy", "title"))
            .field(FieldDef::search("title", text(WORDS)))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedCopy { ref field, ref target } if field == "title_copy" && target == "title"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Schema::builder()
            .field(FieldDef::plain("a", text(WORDS)))
            .field(FieldDef::plain("a", text(WORDS)))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn facets_cannot_be_search_targets() {
        let err = Schema::builder()
            .field(FieldDef::facet("colour", colours(), Cardinality::Fixed(3)).searchable())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn roles_follow_definitions() {
        let schema = Schema::builder()
            .field(FieldDef::plain("id", text(WORDS)))
            .field(FieldDef::search("title", text(WORDS)))
            .field(FieldDef::facet("colour", colours(), Cardinality::Fixed(3)))
            .field(FieldDef::copy_of("colour_text", "colour").searchable())
            .build()
            .unwrap();
        assert_eq!(schema.role("id"), Some(FieldRole::Plain));
        assert_eq!(schema.role("title"), Some(FieldRole::SearchInjected));
        assert_eq!(schema.role("colour"), Some(FieldRole::FacetSource));
        assert_eq!(schema.role("colour_text"), Some(FieldRole::SearchInjected));
        assert_eq!(schema.role("nope"), None);
    }

    #[test]
    fn ratio_above_search_field_count_is_an_error() {
        let schema = Schema::builder().field(FieldDef::search("title", text(WORDS))).build().unwrap();
        let err = schema.configure(params(10, 1.5)).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::TermDocRatio { max, .. }) if max == 1.0));
        assert!(schema.configure(params(10, 0.0)).is_err());
    }

    #[test]
    fn no_search_fields_is_an_error() {
        let schema = Schema::builder().field(FieldDef::plain("id", text(WORDS))).build().unwrap();
        let err = schema.configure(params(10, 0.5)).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NoSearchFields)));
    }

    #[test]
    fn mismatched_distribution_is_rejected() {
        let schema = Schema::builder().field(FieldDef::search("title", text(WORDS))).build().unwrap();
        let dist = TermDistribution::new(3, &DistributionParams::new(10)).unwrap();
        let err = schema.configure_with(terms(5), dist, 0).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn absent_search_field_is_created_for_a_term() {
        let schema = Schema::builder().field(FieldDef::search("title", text(WORDS)).gate(0.0)).build().unwrap();
        let configured = schema.configure(params(5, 1.0)).unwrap();
        for doc in configured.documents() {
            let title = doc.get("title").and_then(Value::as_str).unwrap();
            assert!(title.starts_with("term"), "{title}");
        }
    }

    #[test]
    fn overwrite_replaces_the_whole_value() {
        let schema = Schema::builder().field(FieldDef::search("title", text(WORDS))).build().unwrap();
        let configured = schema
            .configure(InjectionParams { overwrite_chance: 1.0, ..params(20, 1.0) })
            .unwrap();
        for doc in configured.documents() {
            assert!(doc.get("title").and_then(Value::as_str).unwrap().starts_with("term"));
            assert_eq!(doc.strings("title")[0].split(' ').count(), 1);
        }
    }

    #[test]
    fn insertion_keeps_base_words() {
        let schema = Schema::builder().field(FieldDef::search("title", text(WORDS))).build().unwrap();
        let configured = schema.configure(params(20, 1.0)).unwrap();
        for doc in configured.documents() {
            let title = doc.strings("title")[0];
            assert_eq!(title.split(' ').count(), 5, "{title}");
            assert_eq!(title.split(' ').filter(|w| w.starts_with("term")).count(), 1);
        }
    }

    #[test]
    fn insert_at_word_boundary_can_append() {
        let mut hits = [false; 3];
        for slot in 0..200 {
            let mut rng = slot_rng(1, 1, slot);
            let out = insert_at_word_boundary("a b", "T", &mut rng);
            match out.as_str() {
                "T a b" => hits[0] = true,
                "a T b" => hits[1] = true,
                "a b T" => hits[2] = true,
                other => panic!("unexpected {other}"),
            }
        }
        assert_eq!(hits, [true; 3]);
    }

    #[test]
    fn document_rejects_out_of_range_slot() {
        let schema = Schema::builder().field(FieldDef::search("title", text(WORDS))).build().unwrap();
        let configured = schema.configure(params(3, 0.5)).unwrap();
        assert!(configured.document(2).is_ok());
        assert!(matches!(configured.document(3), Err(ConfigError::SlotOutOfRange { slot: 3, num_docs: 3 })));
    }

    #[test]
    fn per_docs_cardinality_honours_floor() {
        assert_eq!(Cardinality::PerDocs { factor: 0.001, floor: 10 }.resolve(1_000).unwrap(), 10);
        assert_eq!(Cardinality::PerDocs { factor: 0.1, floor: 10 }.resolve(1_000).unwrap(), 100);
        assert!(Cardinality::Fixed(0).resolve(10).is_err());
        assert!(Cardinality::PerDocs { factor: -1.0, floor: 1 }.resolve(10).is_err());
    }
}
