//! Short, human-readable article identifiers.
//!
//! A slug is the first 15 alphanumeric characters of the lowercased title
//! followed by 8 random lowercase alphanumerics. Uniqueness is checked against
//! a caller-supplied set; the caller registers each returned slug before
//! generating the next one in a batch.

pub mod cache;

pub use cache::SlugCache;

use rand::Rng;
use std::collections::HashSet;

const TITLE_PREFIX_LEN: usize = 15;
const RANDOM_SUFFIX_LEN: usize = 8;
const MAX_RANDOM_ATTEMPTS: usize = 10;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a slug that is not contained in `existing`.
pub fn generate_unique_slug(title: &str, existing: &HashSet<String>) -> String {
    generate_unique_slug_with(title, existing, &mut rand::thread_rng())
}

/// Same as [`generate_unique_slug`] with an explicit random source.
pub fn generate_unique_slug_with<R: Rng + ?Sized>(
    title: &str,
    existing: &HashSet<String>,
    rng: &mut R,
) -> String {
    let prefix = title_prefix(title);

    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let candidate = format!("{}{}", prefix, random_suffix(rng));
        if !existing.contains(&candidate) {
            return candidate;
        }
    }

    // Still colliding: fix one candidate and count upwards.
    let base = format!("{}{}", prefix, random_suffix(rng));
    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{}{}", base, counter);
        if !existing.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn title_prefix(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(TITLE_PREFIX_LEN)
        .collect()
}

fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..RANDOM_SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}
