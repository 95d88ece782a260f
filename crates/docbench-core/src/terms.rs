//! Vocabulary and distribution generator.
//!
//! Builds fixed vocabularies of distinct terms (single words and multi-word
//! phrases) and [`TermDistribution`]s that spread those terms across a known
//! number of document slots.
//!
//! A distribution runs in two passes that are both pure functions of the
//! slot index:
//!
//! 1. **Guaranteed pass.** A seeded permutation of the vocabulary is laid out
//!    over evenly spaced slots, so every item lands at least once and no run
//!    of neighbouring slots hogs the schedule.
//! 2. **Weighted pass.** Remaining slots are selected with an adjusted
//!    probability so the overall injected fraction tracks `occurrence`, and
//!    selected slots draw extra items from a CDF over the skew weights.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::emitter::{slot_rng, stream, Emitter, SlotRng};
use crate::error::{unit_interval, ConfigError, GenerationError};

/// Phrase counts as fractions of the single-word vocabulary size, for 2-, 3-,
/// 4- and 5-word phrases.
pub const DEFAULT_PHRASE_FACTORS: [f64; 4] = [0.5, 0.3, 0.16, 0.04];

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// An ordered list of distinct terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    pub fn new(items: Vec<String>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.as_str()) {
                return Err(ConfigError::DuplicateTerm(item.clone()));
            }
        }
        Ok(Self(items))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Append `other`, rejecting any term present in both.
    pub fn concat(self, other: Vocabulary) -> Result<Self, ConfigError> {
        let mut items = self.0;
        items.extend(other.0);
        Self::new(items)
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = ConfigError;

    fn try_from(items: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.0
    }
}

fn draw_budget(size: usize) -> usize {
    size.saturating_mul(50).saturating_add(1000)
}

/// Up-front allocation for draw loops; larger sets grow as they fill.
const MAX_PREALLOC: usize = 4096;

/// Consecutive duplicate draws after which a vocabulary build gives up,
/// whatever the remaining budget.
const MAX_DUPLICATE_RUN: usize = 10_000;

/// Draw `size` distinct values from `emitter`, sorted by (length, text).
///
/// Fails immediately if the emitter declares fewer unique values than
/// requested, and after a bounded number of draws otherwise. A long run of
/// duplicate draws also ends the build early.
pub fn make_vocabulary<E>(emitter: &E, size: usize, seed: u64) -> Result<Vocabulary, GenerationError>
where
    E: Emitter<String> + ?Sized,
{
    if let Some(available) = emitter.max_unique() {
        if available < size {
            return Err(GenerationError::Exhausted { available, requested: size });
        }
    }

    let mut rng = slot_rng(seed, stream::VOCABULARY, 0);
    let budget = draw_budget(size);
    let mut seen = HashSet::with_capacity(size.min(MAX_PREALLOC));
    let mut words = Vec::with_capacity(size.min(MAX_PREALLOC));
    let mut attempts = 0;
    let mut duplicates = 0;

    while words.len() < size {
        if attempts == budget || duplicates == MAX_DUPLICATE_RUN {
            return Err(GenerationError::Stalled { found: words.len(), requested: size, attempts });
        }
        let word = emitter.emit(attempts, &mut rng);
        attempts += 1;
        if seen.insert(word.clone()) {
            words.push(word);
            duplicates = 0;
        } else {
            duplicates += 1;
        }
    }

    words.sort_by(|a, b| a.chars().count().cmp(&b.chars().count()).then_with(|| a.cmp(b)));
    tracing::debug!(size, attempts, "vocabulary built");
    Ok(Vocabulary(words))
}

/// Default phrase counts for a vocabulary of `vocab_size` words.
pub fn default_phrase_counts(vocab_size: usize) -> Vec<usize> {
    DEFAULT_PHRASE_FACTORS
        .iter()
        .map(|f| (vocab_size as f64 * f).round() as usize)
        .collect()
}

/// Bell curve over the word list centred on its middle, so phrases favour
/// mid-vocabulary words over both ends.
pub fn phrase_word_chooser(vocab: usize) -> Result<WeightedChoice, ConfigError> {
    let n = vocab as f64;
    let skew = Skew::Gaussian { mu: 0.5 * n, sigma: (0.2 * n).max(0.2) };
    WeightedChoice::new(&skew.weights(vocab)?)
}

/// Compose distinct phrases from `words`. `counts[i]` phrases of `i + 2`
/// words each are produced, in length order and sorted within each length.
/// Words are picked through [`phrase_word_chooser`].
pub fn make_phrases(words: &Vocabulary, counts: &[usize], seed: u64) -> Result<Vocabulary, GenerationError> {
    let vocab = words.len();
    let mut rng = slot_rng(seed, stream::PHRASES, 0);
    let mut seen: HashSet<String> = words.iter().map(str::to_string).collect();
    let total = counts.iter().fold(0usize, |n, &c| n.saturating_add(c));
    let mut phrases = Vec::with_capacity(total.min(MAX_PREALLOC));
    // An empty word list only fails below, once a phrase is actually requested.
    let chooser = phrase_word_chooser(vocab.max(1))?;

    for (i, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let len = i + 2;
        // `None` means the combination space overflowed u128, i.e. is huge.
        let space = (vocab as u128).checked_pow(len as u32);
        if vocab == 0 || space.is_some_and(|s| s < count as u128) {
            return Err(GenerationError::PhraseSpace { words: len, requested: count, vocab });
        }

        let start = phrases.len();
        let budget = draw_budget(count);
        let mut made = 0;
        let mut attempts = 0;
        while made < count {
            if attempts == budget {
                return Err(GenerationError::Stalled { found: made, requested: count, attempts });
            }
            attempts += 1;
            let phrase = (0..len)
                .map(|_| words.0[chooser.sample(&mut rng)].as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if seen.insert(phrase.clone()) {
                phrases.push(phrase);
                made += 1;
            }
        }
        phrases[start..].sort_unstable();
        tracing::debug!(words = len, count, attempts, "phrases built");
    }

    Ok(Vocabulary(phrases))
}

/// Build a complete search-term vocabulary: `vocab_size` words followed by
/// phrases composed from them. `phrase_counts` defaults to
/// [`default_phrase_counts`].
pub fn search_terms<E>(
    emitter: &E,
    vocab_size: usize,
    phrase_counts: Option<&[usize]>,
    seed: u64,
) -> Result<Vocabulary, GenerationError>
where
    E: Emitter<String> + ?Sized,
{
    let words = make_vocabulary(emitter, vocab_size, seed)?;
    let defaults;
    let counts = match phrase_counts {
        Some(c) => c,
        None => {
            defaults = default_phrase_counts(vocab_size);
            &defaults
        }
    };
    let phrases = make_phrases(&words, counts, seed)?;
    let mut items = words.0;
    items.extend(phrases.0);
    Ok(Vocabulary(items))
}

// ---------------------------------------------------------------------------
// Skew curves
// ---------------------------------------------------------------------------

/// Relative weight of each vocabulary item by rank (rank 1 first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Skew {
    Uniform,
    Zipf { exponent: f64 },
    /// Bell curve over rank, centred on `mu`.
    Gaussian { mu: f64, sigma: f64 },
    Explicit { weights: Vec<f64> },
}

impl Skew {
    /// Long-tail curve for `n` facet values: a few values near the top own
    /// most documents.
    pub fn long_tail(n: usize) -> Self {
        let n = n as f64;
        Skew::Gaussian {
            mu: (n * 0.01).max(1.0),
            sigma: (n * 0.1).clamp(1.0, 500.0),
        }
    }

    /// Materialise weights for `n` ranks. All weights are finite and positive.
    pub fn weights(&self, n: usize) -> Result<Vec<f64>, ConfigError> {
        let weights: Vec<f64> = match self {
            Skew::Uniform => vec![1.0; n],
            Skew::Zipf { exponent } => {
                if !exponent.is_finite() || *exponent < 0.0 {
                    return Err(ConfigError::Skew(format!(
                        "zipf exponent must be finite and non-negative, got {exponent}"
                    )));
                }
                (1..=n).map(|r| 1.0 / (r as f64).powf(*exponent)).collect()
            }
            Skew::Gaussian { mu, sigma } => {
                if !mu.is_finite() || !sigma.is_finite() || *sigma <= 0.0 {
                    return Err(ConfigError::Skew(format!(
                        "gaussian needs finite mu and positive sigma, got mu={mu} sigma={sigma}"
                    )));
                }
                (1..=n)
                    .map(|r| {
                        let z = (r as f64 - mu) / sigma;
                        (-0.5 * z * z).exp().max(f64::MIN_POSITIVE)
                    })
                    .collect()
            }
            Skew::Explicit { weights } => {
                if weights.len() != n {
                    return Err(ConfigError::Skew(format!(
                        "expected {n} explicit weights, got {}",
                        weights.len()
                    )));
                }
                weights.clone()
            }
        };
        check_weights(&weights)?;
        Ok(weights)
    }
}

fn check_weights(weights: &[f64]) -> Result<(), ConfigError> {
    match weights.iter().position(|w| !w.is_finite() || *w <= 0.0) {
        Some(i) => Err(ConfigError::Skew(format!(
            "weight at rank {} must be finite and positive, got {}",
            i + 1,
            weights[i]
        ))),
        None => Ok(()),
    }
}

/// O(log n) weighted index sampler over a precomputed CDF.
#[derive(Debug, Clone)]
pub struct WeightedChoice {
    cdf: Vec<f64>,
}

impl WeightedChoice {
    pub fn new(weights: &[f64]) -> Result<Self, ConfigError> {
        if weights.is_empty() {
            return Err(ConfigError::Skew("no weights to choose from".into()));
        }
        check_weights(weights)?;

        let total: f64 = weights.iter().sum();
        let mut running = 0.0;
        let mut cdf: Vec<f64> = weights
            .iter()
            .map(|w| {
                running += w;
                running / total
            })
            .collect();
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        Ok(Self { cdf })
    }

    pub fn len(&self) -> usize {
        self.cdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdf.is_empty()
    }

    /// Probability mass of index `i`, or `None` past the end.
    pub fn probability(&self, i: usize) -> Option<f64> {
        let upper = *self.cdf.get(i)?;
        let lower = i.checked_sub(1).map_or(0.0, |j| self.cdf[j]);
        Some(upper - lower)
    }

    pub fn sample(&self, rng: &mut SlotRng) -> usize {
        let u: f64 = rng.random();
        self.cdf.partition_point(|&c| c <= u).min(self.cdf.len() - 1)
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// How many items a selected slot receives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerSlot {
    Fixed(usize),
    Range { min: usize, max: usize },
    /// Average count; the fractional part is decided per slot.
    Mean(f64),
}

impl PerSlot {
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            PerSlot::Fixed(0) => Err(ConfigError::Zero("items per slot")),
            PerSlot::Range { min, max } if min == 0 || min > max => Err(ConfigError::RepeatRange { min, max }),
            PerSlot::Mean(m) if !m.is_finite() || m < 1.0 => {
                Err(ConfigError::Invalid(format!("mean items per slot must be at least 1, got {m}")))
            }
            _ => Ok(()),
        }
    }

    fn sample(&self, rng: &mut SlotRng) -> usize {
        match *self {
            PerSlot::Fixed(n) => n,
            PerSlot::Range { min, max } => rng.random_range(min..=max),
            PerSlot::Mean(m) => {
                let base = m.floor();
                base as usize + usize::from(rng.random_bool(m - base))
            }
        }
    }

    /// Largest count a slot can draw outside the guaranteed pass.
    pub fn max(&self) -> usize {
        match *self {
            PerSlot::Fixed(n) => n,
            PerSlot::Range { max, .. } => max,
            PerSlot::Mean(m) => m.ceil() as usize,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionParams {
    /// Number of document slots the distribution spans.
    pub num_docs: usize,
    /// Target fraction of slots that receive at least one item.
    pub occurrence: f64,
    pub per_slot: PerSlot,
    /// Chance that a placement replaces the slot's base value.
    pub overwrite_chance: f64,
    pub skew: Skew,
    pub seed: u64,
}

impl DistributionParams {
    pub fn new(num_docs: usize) -> Self {
        Self {
            num_docs,
            occurrence: 1.0,
            per_slot: PerSlot::Fixed(1),
            overwrite_chance: 0.0,
            skew: Skew::Uniform,
            seed: 0,
        }
    }
}

/// One vocabulary item placed into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index into the vocabulary.
    pub item: usize,
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAssignment {
    pub slot: usize,
    pub placements: Vec<Placement>,
}

impl SlotAssignment {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = usize> + '_ {
        self.placements.iter().map(|p| p.item)
    }
}

/// Slot-addressable assignment of vocabulary items to `num_docs` slots.
#[derive(Debug, Clone)]
pub struct TermDistribution {
    num_docs: usize,
    vocab_len: usize,
    permutation: Vec<usize>,
    extra_chance: f64,
    per_slot: PerSlot,
    overwrite_chance: f64,
    choice: WeightedChoice,
    seed: u64,
}

impl TermDistribution {
    pub fn new(vocab_len: usize, params: &DistributionParams) -> Result<Self, ConfigError> {
        if params.num_docs == 0 {
            return Err(ConfigError::Zero("num_docs"));
        }
        if vocab_len == 0 {
            return Err(ConfigError::Zero("vocabulary size"));
        }
        let occurrence = unit_interval("occurrence", params.occurrence)?;
        let overwrite_chance = unit_interval("overwrite_chance", params.overwrite_chance)?;
        params.per_slot.validate()?;
        if params.per_slot.max() > vocab_len {
            return Err(ConfigError::PerSlotAboveVocabulary { per_slot: params.per_slot.max(), vocab_len });
        }
        let choice = WeightedChoice::new(&params.skew.weights(vocab_len)?)?;

        let mut permutation: Vec<usize> = (0..vocab_len).collect();
        permutation.shuffle(&mut slot_rng(params.seed, stream::PERMUTATION, 0));

        // Guaranteed slots already count toward `occurrence`; top up the rest.
        let guaranteed = vocab_len.min(params.num_docs);
        let extra_chance = if params.num_docs > guaranteed {
            let (n, g) = (params.num_docs as f64, guaranteed as f64);
            ((occurrence * n - g) / (n - g)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        tracing::debug!(
            num_docs = params.num_docs,
            vocab_len,
            guaranteed,
            extra_chance,
            "term distribution ready"
        );

        Ok(Self {
            num_docs: params.num_docs,
            vocab_len,
            permutation,
            extra_chance,
            per_slot: params.per_slot,
            overwrite_chance,
            choice,
            seed: params.seed,
        })
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab_len
    }

    /// Items assigned to `slot`. Same configuration, same slot, same answer.
    pub fn assignment(&self, slot: usize) -> Result<SlotAssignment, ConfigError> {
        if slot >= self.num_docs {
            return Err(ConfigError::SlotOutOfRange { slot, num_docs: self.num_docs });
        }
        Ok(self.assign(slot))
    }

    pub fn iter(&self) -> Assignments<'_> {
        Assignments { dist: self, next: 0 }
    }

    /// Realised number of slots each vocabulary item lands in.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.vocab_len];
        for assignment in self.iter() {
            for item in assignment.items() {
                counts[item] += 1;
            }
        }
        counts
    }

    pub(crate) fn assign(&self, slot: usize) -> SlotAssignment {
        let mut rng = slot_rng(self.seed, stream::ASSIGNMENT, slot as u64);
        let mut items = self.guaranteed(slot);
        let selected = !items.is_empty() || rng.random_bool(self.extra_chance);
        if !selected {
            return SlotAssignment { slot, placements: Vec::new() };
        }

        let want = self.per_slot.sample(&mut rng);
        let mut retries = 0;
        while items.len() < want && retries < want.saturating_mul(8) {
            let pick = self.choice.sample(&mut rng);
            if items.contains(&pick) {
                retries += 1;
            } else {
                items.push(pick);
            }
        }
        // Heavily skewed weights can keep redrawing the same items; top up in
        // rank order. `want <= vocab_len` is checked at construction.
        let mut rank = 0;
        while items.len() < want && rank < self.vocab_len {
            if !items.contains(&rank) {
                items.push(rank);
            }
            rank += 1;
        }

        let placements = items
            .into_iter()
            .map(|item| Placement { item, overwrite: rng.random_bool(self.overwrite_chance) })
            .collect();
        SlotAssignment { slot, placements }
    }

    /// Guaranteed-pass items for `slot`. With V items over N slots, position
    /// k lands on slot floor(k * N / V) when V <= N and on slot k % N
    /// otherwise.
    fn guaranteed(&self, slot: usize) -> Vec<usize> {
        let (n, v) = (self.num_docs as u128, self.vocab_len as u128);
        if v <= n {
            let k = (slot as u128 * v).div_ceil(n);
            if k < v && k * n / v == slot as u128 {
                vec![self.permutation[k as usize]]
            } else {
                Vec::new()
            }
        } else {
            (slot..self.vocab_len)
                .step_by(self.num_docs)
                .map(|k| self.permutation[k])
                .collect()
        }
    }
}

/// Iterator over every slot's assignment, in slot order.
pub struct Assignments<'a> {
    dist: &'a TermDistribution,
    next: usize,
}

impl Iterator for Assignments<'_> {
    type Item = SlotAssignment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.dist.num_docs {
            return None;
        }
        let assignment = self.dist.assign(self.next);
        self.next += 1;
        Some(assignment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.dist.num_docs - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Assignments<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::FnEmitter;
    use rstest::rstest;

    fn numbered() -> FnEmitter<impl Fn(usize, &mut SlotRng) -> String + Send + Sync> {
        FnEmitter(|_: usize, rng: &mut SlotRng| format!("w{}", rng.random_range(0..10_000u32)))
    }

    #[test]
    fn vocabulary_rejects_duplicates() {
        let err = Vocabulary::new(vec!["a".into(), "b".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTerm(t) if t == "a"));
    }

    #[test]
    fn vocabulary_sorted_by_length_then_text() {
        let vocab = make_vocabulary(&numbered(), 50, 3).unwrap();
        let items = vocab.as_slice();
        assert_eq!(items.len(), 50);
        for pair in items.windows(2) {
            let key = |s: &String| (s.len(), s.clone());
            assert!(key(&pair[0]) < key(&pair[1]), "{pair:?}");
        }
    }

    #[test]
    fn exhausted_emitter_fails_before_drawing() {
        struct Three;
        impl Emitter<String> for Three {
            fn emit(&self, _: usize, _: &mut SlotRng) -> String {
                panic!("must not be drawn from")
            }
            fn max_unique(&self) -> Option<usize> {
                Some(3)
            }
        }
        let err = make_vocabulary(&Three, 5, 0).unwrap_err();
        assert!(matches!(err, GenerationError::Exhausted { available: 3, requested: 5 }));
    }

    #[test]
    fn stuck_emitter_stalls_instead_of_looping() {
        let same = FnEmitter(|_: usize, _: &mut SlotRng| "same".to_string());
        let err = make_vocabulary(&same, 2, 0).unwrap_err();
        assert!(matches!(err, GenerationError::Stalled { found: 1, requested: 2, attempts: 1100 }));
    }

    #[test]
    fn phrase_space_too_small_fails_fast() {
        let words = Vocabulary::new(vec!["a".into(), "b".into()]).unwrap();
        // 2^2 = 4 two-word combinations, 5 requested.
        let err = make_phrases(&words, &[5], 0).unwrap_err();
        assert!(matches!(err, GenerationError::PhraseSpace { words: 2, requested: 5, vocab: 2 }));
    }

    #[test]
    fn phrases_have_expected_word_counts() {
        let words = make_vocabulary(&numbered(), 40, 1).unwrap();
        let phrases = make_phrases(&words, &[6, 3, 1], 1).unwrap();
        let lens: Vec<usize> = phrases.iter().map(|p| p.split(' ').count()).collect();
        assert_eq!(lens, vec![2, 2, 2, 2, 2, 2, 3, 3, 3, 4]);
    }

    #[test]
    fn default_phrase_counts_round() {
        assert_eq!(default_phrase_counts(100), vec![50, 30, 16, 4]);
        assert_eq!(default_phrase_counts(10), vec![5, 3, 2, 0]);
    }

    #[test]
    fn search_terms_puts_words_before_phrases() {
        let terms = search_terms(&numbered(), 20, Some(&[4][..]), 9).unwrap();
        assert_eq!(terms.len(), 24);
        assert!(terms.iter().take(20).all(|t| !t.contains(' ')));
        assert!(terms.iter().skip(20).all(|t| t.split(' ').count() == 2));
    }

    #[rstest]
    #[case(Skew::Zipf { exponent: -1.0 })]
    #[case(Skew::Zipf { exponent: f64::NAN })]
    #[case(Skew::Gaussian { mu: 1.0, sigma: 0.0 })]
    #[case(Skew::Explicit { weights: vec![1.0, 2.0] })]
    #[case(Skew::Explicit { weights: vec![1.0, 0.0, 2.0] })]
    fn invalid_skews_are_rejected(#[case] skew: Skew) {
        assert!(matches!(skew.weights(3), Err(ConfigError::Skew(_))));
    }

    #[test]
    fn long_tail_weights_descend_and_stay_positive() {
        let weights = Skew::long_tail(2_000).weights(2_000).unwrap();
        assert!(weights.iter().all(|w| *w > 0.0));
        assert!(weights[20] > weights[200]);
        assert!(weights[200] > weights[1_000]);
    }

    #[test]
    fn weighted_choice_masses_sum_to_one() {
        let choice = WeightedChoice::new(&[3.0, 1.0]).unwrap();
        assert!((choice.probability(0).unwrap() - 0.75).abs() < 1e-12);
        assert!((choice.probability(1).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(choice.probability(2), None);
        assert_eq!(choice.probability(usize::MAX), None);
    }

    #[test]
    fn phrase_words_favour_the_middle_of_the_vocabulary() {
        let words = Vocabulary::new((0..100).map(|i| format!("w{i:03}")).collect()).unwrap();
        let phrases = make_phrases(&words, &[400, 200], 5).unwrap();
        let mut hits = [0usize; 100];
        for word in phrases.iter().flat_map(|p| p.split(' ')) {
            hits[word[1..].parse::<usize>().unwrap()] += 1;
        }
        let middle: usize = hits[40..60].iter().sum();
        let edges: usize = hits[..10].iter().chain(&hits[90..]).sum();
        assert!(middle > 4 * edges, "middle {middle}, edges {edges}");
    }

    #[test]
    fn phrases_are_sorted_within_each_length() {
        let words = make_vocabulary(&numbered(), 40, 1).unwrap();
        let phrases = make_phrases(&words, &[6, 3, 1], 1).unwrap();
        let items = phrases.as_slice();
        assert!(items[..6].windows(2).all(|p| p[0] < p[1]), "{items:?}");
        assert!(items[6..9].windows(2).all(|p| p[0] < p[1]), "{items:?}");
    }

    #[test]
    fn huge_vocabulary_request_stalls_without_preallocating() {
        let same = FnEmitter(|_: usize, _: &mut SlotRng| "same".to_string());
        let err = make_vocabulary(&same, usize::MAX / 64, 0).unwrap_err();
        assert!(matches!(err, GenerationError::Stalled { found: 1, attempts, .. } if attempts == MAX_DUPLICATE_RUN + 1));
    }

    #[test]
    fn guaranteed_slots_are_evenly_spaced() {
        let dist = TermDistribution::new(4, &DistributionParams { occurrence: 0.0, ..DistributionParams::new(10) }).unwrap();
        let injected: Vec<usize> = dist.iter().filter(|a| !a.is_empty()).map(|a| a.slot).collect();
        assert_eq!(injected, vec![0, 2, 5, 7]);
    }

    #[test]
    fn more_items_than_slots_doubles_up() {
        let dist = TermDistribution::new(7, &DistributionParams::new(3)).unwrap();
        let per_slot: Vec<usize> = dist.iter().map(|a| a.placements.len()).collect();
        assert_eq!(per_slot, vec![3, 2, 2]);
    }

    #[test]
    fn out_of_range_parameters_are_errors() {
        let bad = DistributionParams { occurrence: 1.2, ..DistributionParams::new(10) };
        assert!(matches!(TermDistribution::new(3, &bad), Err(ConfigError::OutOfUnitRange { name: "occurrence", .. })));

        let bad = DistributionParams { overwrite_chance: -0.1, ..DistributionParams::new(10) };
        assert!(TermDistribution::new(3, &bad).is_err());

        assert!(matches!(TermDistribution::new(0, &DistributionParams::new(10)), Err(ConfigError::Zero(_))));
        assert!(matches!(TermDistribution::new(3, &DistributionParams::new(0)), Err(ConfigError::Zero(_))));

        let dist = TermDistribution::new(3, &DistributionParams::new(10)).unwrap();
        assert!(matches!(dist.assignment(10), Err(ConfigError::SlotOutOfRange { slot: 10, num_docs: 10 })));
    }

    #[test]
    fn mean_per_slot_averages_out() {
        let params = DistributionParams { per_slot: PerSlot::Mean(1.5), ..DistributionParams::new(4_000) };
        let dist = TermDistribution::new(500, &params).unwrap();
        let total: usize = dist.iter().map(|a| a.placements.len()).sum();
        let mean = total as f64 / 4_000.0;
        assert!((mean - 1.5).abs() < 0.05, "mean {mean}");
    }
}
