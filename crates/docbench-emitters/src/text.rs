//! String emitters.

use std::collections::BTreeSet;
use std::ops::Range;

use docbench_core::emitter::{Emitter, SlotRng};
use fake::Fake;
use rand::seq::IndexedRandom;
use rand::Rng;

/// A single lorem-ipsum word.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoremWord;

impl Emitter<String> for LoremWord {
    fn emit(&self, _slot: usize, rng: &mut SlotRng) -> String {
        fake::faker::lorem::en::Word().fake_with_rng::<String, _>(rng)
    }
}

/// Random lowercase ASCII strings with a length in `[min_len, max_len]`.
///
/// Unlike [`LoremWord`] the number of distinct outputs is known, so
/// vocabulary builders can reject impossible sizes up front.
#[derive(Debug, Clone, Copy)]
pub struct Letters {
    min_len: usize,
    max_len: usize,
}

impl Letters {
    /// Lengths are reordered if given backwards; zero becomes one.
    pub fn new(min_len: usize, max_len: usize) -> Self {
        let (lo, hi) = if min_len <= max_len { (min_len, max_len) } else { (max_len, min_len) };
        Self { min_len: lo.max(1), max_len: hi.max(1) }
    }
}

impl Emitter<String> for Letters {
    fn emit(&self, _slot: usize, rng: &mut SlotRng) -> String {
        let len = rng.random_range(self.min_len..=self.max_len);
        (0..len).map(|_| char::from(b'a' + rng.random_range(0..26u8))).collect()
    }

    fn max_unique(&self) -> Option<usize> {
        let mut total = 0usize;
        for len in self.min_len..=self.max_len {
            let n = u32::try_from(len).ok().and_then(|len| 26usize.checked_pow(len));
            total = total.saturating_add(n.unwrap_or(usize::MAX));
        }
        Some(total)
    }
}

/// A lorem-ipsum sentence with a word count drawn from `words`.
#[derive(Debug, Clone)]
pub struct Sentence {
    pub words: Range<usize>,
}

impl Sentence {
    pub fn new(words: Range<usize>) -> Self {
        Self { words }
    }
}

impl Emitter<String> for Sentence {
    fn emit(&self, _slot: usize, rng: &mut SlotRng) -> String {
        fake::faker::lorem::en::Sentence(self.words.clone()).fake_with_rng::<String, _>(rng)
    }
}

/// A full English person name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonName;

impl Emitter<String> for PersonName {
    fn emit(&self, _slot: usize, rng: &mut SlotRng) -> String {
        fake::faker::name::en::Name().fake_with_rng::<String, _>(rng)
    }
}

/// Upper-cases the first character of the inner emitter's output.
#[derive(Debug, Clone)]
pub struct Capitalize<E>(pub E);

impl<E: Emitter<String>> Emitter<String> for Capitalize<E> {
    fn emit(&self, slot: usize, rng: &mut SlotRng) -> String {
        let s = self.0.emit(slot, rng);
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => s,
        }
    }

    fn max_unique(&self) -> Option<usize> {
        self.0.max_unique()
    }
}

/// Uniform pick from a fixed list.
#[derive(Debug, Clone)]
pub struct Choice {
    items: Vec<String>,
}

impl Choice {
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self { items: items.into_iter().map(Into::into).collect() }
    }
}

impl Emitter<String> for Choice {
    fn emit(&self, _slot: usize, rng: &mut SlotRng) -> String {
        self.items.choose(rng).cloned().unwrap_or_default()
    }

    fn max_unique(&self) -> Option<usize> {
        Some(self.items.iter().collect::<BTreeSet<_>>().len())
    }
}

/// Always the same string.
#[derive(Debug, Clone)]
pub struct Static(pub String);

impl Emitter<String> for Static {
    fn emit(&self, _slot: usize, _rng: &mut SlotRng) -> String {
        self.0.clone()
    }

    fn max_unique(&self) -> Option<usize> {
        Some(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
