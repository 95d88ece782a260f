//! Numeric, date and identifier emitters.

use chrono::{DateTime, TimeDelta, Utc};
use docbench_core::emitter::{Emitter, SlotRng};
use rand::Rng;

/// Format used for every emitted timestamp.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Integers drawn uniformly from `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct IntRange {
    min: i64,
    max: i64,
}

impl IntRange {
    pub fn new(min: i64, max: i64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

impl Emitter<i64> for IntRange {
    fn emit(&self, _slot: usize, rng: &mut SlotRng) -> i64 {
        rng.random_range(self.min..=self.max)
    }

    fn max_unique(&self) -> Option<usize> {
        let span = self.max.abs_diff(self.min);
        Some(usize::try_from(span).unwrap_or(usize::MAX).saturating_add(1))
    }
}

/// Second-resolution UTC timestamps between `start` and `end` inclusive,
/// rendered with [`DATE_FORMAT`].
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    start: DateTime<Utc>,
    span_secs: i64,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self { start, span_secs: (end - start).num_seconds() }
    }
}

impl Emitter<String> for DateRange {
    fn emit(&self, _slot: usize, rng: &mut SlotRng) -> String {
        let offset = rng.random_range(0..=self.span_secs);
        (self.start + TimeDelta::seconds(offset)).format(DATE_FORMAT).to_string()
    }
}

/// `{prefix}{slot}` zero-padded to `width` digits. Unique per slot, so it
/// makes a natural document key.
#[derive(Debug, Clone)]
pub struct SequentialId {
    prefix: String,
    width: usize,
}

impl SequentialId {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self { prefix: prefix.into(), width }
    }
}

impl Emitter<String> for SequentialId {
    fn emit(&self, slot: usize, _rng: &mut SlotRng) -> String {
        format!("{}{:0width$}", self.prefix, slot, width = self.width)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
