//! Field emitter contract.
//!
//! An [`Emitter`] produces one value per invocation from a caller-supplied
//! RNG. Callers derive that RNG with [`slot_rng`] from `(seed, stream, slot)`,
//! so any value in a document set can be regenerated from its slot index
//! alone, in any order.

use std::marker::PhantomData;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

/// RNG handed to emitters. Fixed to one algorithm so that a seed means the
/// same thing everywhere.
pub type SlotRng = ChaCha8Rng;

/// A producer of field values.
pub trait Emitter<T>: Send + Sync {
    /// Produce a value for `slot`. Most emitters ignore `slot` and draw
    /// entirely from `rng`.
    fn emit(&self, slot: usize, rng: &mut SlotRng) -> T;

    /// Upper bound on the number of distinct values this emitter can produce,
    /// if known. Vocabulary builders use it to fail fast.
    fn max_unique(&self) -> Option<usize> {
        None
    }
}

impl<T, E: Emitter<T> + ?Sized> Emitter<T> for Box<E> {
    fn emit(&self, slot: usize, rng: &mut SlotRng) -> T {
        (**self).emit(slot, rng)
    }

    fn max_unique(&self) -> Option<usize> {
        (**self).max_unique()
    }
}

impl<T, E: Emitter<T> + ?Sized> Emitter<T> for Arc<E> {
    fn emit(&self, slot: usize, rng: &mut SlotRng) -> T {
        (**self).emit(slot, rng)
    }

    fn max_unique(&self) -> Option<usize> {
        (**self).max_unique()
    }
}

pub type SharedEmitter<T> = Arc<dyn Emitter<T>>;

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Wraps a closure `(slot, rng) -> T` as an emitter.
pub struct FnEmitter<F>(pub F);

impl<T, F> Emitter<T> for FnEmitter<F>
where
    F: Fn(usize, &mut SlotRng) -> T + Send + Sync,
{
    fn emit(&self, slot: usize, rng: &mut SlotRng) -> T {
        (self.0)(slot, rng)
    }
}

/// Converts a typed emitter's output into a JSON value for use in a schema.
pub struct IntoValue<E, T> {
    inner: E,
    _out: PhantomData<fn() -> T>,
}

impl<E, T> Emitter<Value> for IntoValue<E, T>
where
    E: Emitter<T>,
    T: Into<Value>,
{
    fn emit(&self, slot: usize, rng: &mut SlotRng) -> Value {
        self.inner.emit(slot, rng).into()
    }

    fn max_unique(&self) -> Option<usize> {
        self.inner.max_unique()
    }
}

/// Adapt `emitter` to produce [`serde_json::Value`]s.
pub fn into_value<E, T>(emitter: E) -> IntoValue<E, T>
where
    E: Emitter<T>,
    T: Into<Value>,
{
    IntoValue { inner: emitter, _out: PhantomData }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Stream identifiers for the RNGs the core derives. Field `i` uses
/// `FIELD_BASE + i`.
pub mod stream {
    pub const VOCABULARY: u64 = 1;
    pub const PHRASES: u64 = 2;
    pub const PERMUTATION: u64 = 3;
    pub const ASSIGNMENT: u64 = 4;
    pub const ROUTING: u64 = 5;
    pub const FACET_BASE: u64 = 1 << 16;
    pub const FIELD_BASE: u64 = 1 << 32;
}

/// Derive an independent RNG for `(seed, stream, slot)`.
pub fn slot_rng(seed: u64, stream: u64, slot: u64) -> SlotRng {
    let key = splitmix64(splitmix64(seed ^ splitmix64(stream)) ^ slot);
    SlotRng::seed_from_u64(key)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn slot_rng_is_reproducible() {
        let mut a = slot_rng(7, 1, 99);
        let mut b = slot_rng(7, 1, 99);
        for _ in 0..4 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn neighbouring_slots_diverge() {
        let x: u64 = slot_rng(7, 1, 0).random();
        let y: u64 = slot_rng(7, 1, 1).random();
        let z: u64 = slot_rng(7, 2, 0).random();
        assert_ne!(x, y);
        assert_ne!(x, z);
    }

    #[test]
    fn into_value_forwards_max_unique() {
        struct Two;
        impl Emitter<String> for Two {
            fn emit(&self, slot: usize, _rng: &mut SlotRng) -> String {
                if slot % 2 == 0 { "even".into() } else { "odd".into() }
            }
            fn max_unique(&self) -> Option<usize> {
                Some(2)
            }
        }
        let em = into_value(Two);
        let mut rng = slot_rng(0, 0, 0);
        assert_eq!(em.emit(3, &mut rng), Value::from("odd"));
        assert_eq!(em.max_unique(), Some(2));
    }

    #[test]
    fn fn_emitter_sees_slot() {
        let em = FnEmitter(|slot: usize, _: &mut SlotRng| slot * 10);
        let mut rng = slot_rng(0, 0, 0);
        assert_eq!(em.emit(4, &mut rng), 40);
    }
}
