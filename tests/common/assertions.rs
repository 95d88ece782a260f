//! Domain-specific assertion macros for docbench harnesses.
//!
//! These add context-rich failure messages that make it clear *which*
//! distribution or timing property was violated.

// ---------------------------------------------------------------------------
// Distribution assertions
// ---------------------------------------------------------------------------

/// Assert that every vocabulary item landed in at least one slot.
///
/// ```rust
/// assert_full_coverage!(dist.counts());
/// ```
#[macro_export]
macro_rules! assert_full_coverage {
    ($counts:expr) => {{
        let counts: &[usize] = &$counts;
        let missing: Vec<usize> = counts.iter().enumerate().filter(|(_, &c)| c == 0).map(|(i, _)| i).collect();
        if !missing.is_empty() {
            panic!(
                "assert_full_coverage! failed: {} of {} items never placed.\n  missing ranks: {:?}",
                missing.len(),
                counts.len(),
                missing
            );
        }
    }};
}

/// Assert that counts do not increase with rank beyond `$sigmas` standard
/// deviations of sampling noise (`sqrt(count)` per item).
#[macro_export]
macro_rules! assert_descending_within {
    ($counts:expr, $sigmas:expr) => {{
        let counts: &[usize] = &$counts;
        let sigmas: f64 = $sigmas;
        for (rank, pair) in counts.windows(2).enumerate() {
            let (hi, lo) = (pair[0] as f64, pair[1] as f64);
            let tolerance = sigmas * lo.max(hi).sqrt();
            if lo > hi + tolerance {
                panic!(
                    "assert_descending_within! failed at rank {} -> {}:\n  count[{}] = {}\n  count[{}] = {}\n  tolerance: {:.1}\n  all counts: {:?}",
                    rank,
                    rank + 1,
                    rank,
                    hi,
                    rank + 1,
                    lo,
                    tolerance,
                    counts
                );
            }
        }
    }};
}

// ---------------------------------------------------------------------------
// Numeric and error assertions
// ---------------------------------------------------------------------------

/// Assert two floats agree within `$eps`.
#[macro_export]
macro_rules! assert_close {
    ($actual:expr, $expected:expr) => {
        $crate::assert_close!($actual, $expected, 1e-9)
    };
    ($actual:expr, $expected:expr, $eps:expr) => {{
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        if (actual - expected).abs() > $eps {
            panic!(
                "assert_close! failed:\n  expected: {}\n  actual:   {}\n  eps:      {}",
                expected, actual, $eps
            );
        }
    }};
}

/// Assert that a `docbench_core::Result` failed with a configuration error.
#[macro_export]
macro_rules! assert_config_err {
    ($result:expr) => {{
        match $result {
            Err(e) if e.is_config() => e,
            Err(e) => panic!("assert_config_err! failed: expected a configuration error, got: {e}"),
            Ok(_) => panic!("assert_config_err! failed: expected a configuration error, got Ok"),
        }
    }};
}
