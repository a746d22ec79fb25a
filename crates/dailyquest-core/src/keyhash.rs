//! Stable string-keyed selection.
//!
//! Weekly targets, daily modifiers and similar "random but fixed for this
//! key" choices are derived from a hash of a string key, never from the
//! wall clock, so the same key always yields the same pick.

/// Deterministic hash over string keys.
pub trait KeyHasher {
    fn hash_key(&self, key: &str) -> u32;
}

/// 32-bit FNV-1a. A non-zero seed perturbs the offset basis so that
/// independent installs can disagree while each stays reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fnv1a {
    pub seed: u32,
}

impl Fnv1a {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }
}

impl KeyHasher for Fnv1a {
    fn hash_key(&self, key: &str) -> u32 {
        let mut hash = Self::OFFSET ^ self.seed;
        for b in key.bytes() {
            hash = (hash ^ u32::from(b)).wrapping_mul(Self::PRIME);
        }
        hash
    }
}
