//! Random suffix generation for mutated paths.
//!
//! Suffixes are drawn from the OS entropy source so that observing any
//! number of past namespaces gives no advantage in predicting the next
//! one. The alphabet is lowercase ASCII plus digits, which keeps the
//! mutated paths URL-safe without escaping.

use rand::rngs::OsRng;
use rand::Rng;

use crate::models::SUFFIX_ALPHABET;

/// Source of path suffixes.
///
/// The mutator draws through this trait so tests can script the exact
/// sequence of suffixes and force collision handling deterministically.
/// Production code always uses [`EntropySuffixSource`].
pub trait SuffixSource {
    /// Draws one suffix of the given length.
    fn draw(&mut self, len: usize) -> String;
}

/// Cryptographically strong suffix source backed by `OsRng`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropySuffixSource;

impl SuffixSource for EntropySuffixSource {
    fn draw(&mut self, len: usize) -> String {
        random_suffix(len)
    }
}

/// Draws a fresh random suffix of the given length.
///
/// Every character is sampled independently from
/// [`SUFFIX_ALPHABET`](crate::models::SUFFIX_ALPHABET) using `OsRng`.
///
/// # Example
///
/// ```rust
/// use chameleon_mutator::suffix::random_suffix;
///
/// let s = random_suffix(6);
/// assert_eq!(s.len(), 6);
/// assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
/// ```
#[must_use]
pub fn random_suffix(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect()
}
