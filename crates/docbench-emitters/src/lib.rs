//! docbench-emitters — stock field emitters for docbench schemas.
//!
//! Every emitter draws from the [`SlotRng`](docbench_core::emitter::SlotRng)
//! it is handed and keeps no state of its own, so a field's value for a slot
//! depends only on the seed that slot's RNG was derived from.

pub mod numeric;
pub mod text;

pub use numeric::{DateRange, IntRange, SequentialId};
pub use text::{Capitalize, Choice, Letters, LoremWord, PersonName, Sentence, Static};
