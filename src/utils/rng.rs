use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// SplitMix64 finaliser.
#[inline]
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// Fold a sequence of words into a single well-mixed seed.
pub fn derive_seed(master: u64, words: &[u64]) -> u64 {
    words.iter().fold(mix(master), |acc, &w| mix(acc ^ w))
}

/// Per‑job deterministic RNG.
pub fn job_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}
