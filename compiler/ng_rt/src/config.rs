//! Runtime configuration.

use ng_alloc::{SizeClass, DEFAULT_SIZE_CLASSES};

/// Environment variable holding a fixed hash seed (decimal or `0x` hex).
pub const HASH_SEED_ENV: &str = "NG_HASH_SEED";

/// Settings fixed at runtime creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Size-class table for the object allocator.
    pub size_classes: Vec<SizeClass>,
    /// Seed for string and symbol content hashes. `None` picks a random
    /// seed per runtime.
    pub hash_seed: Option<u64>,
    /// Halve a list's capacity once it is at most a quarter full.
    pub list_shrink: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            size_classes: DEFAULT_SIZE_CLASSES.to_vec(),
            hash_seed: None,
            list_shrink: true,
        }
    }
}

impl RuntimeConfig {
    /// Defaults, with the hash seed taken from [`HASH_SEED_ENV`] when set.
    pub fn from_env() -> Self {
        let mut config = RuntimeConfig::default();
        if let Ok(raw) = std::env::var(HASH_SEED_ENV) {
            match parse_seed(&raw) {
                Some(seed) => config.hash_seed = Some(seed),
                None => tracing::warn!(value = %raw, "ignoring malformed {HASH_SEED_ENV}"),
            }
        }
        config
    }

    #[must_use]
    pub fn with_hash_seed(mut self, seed: u64) -> Self {
        self.hash_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_size_classes(mut self, classes: &[SizeClass]) -> Self {
        self.size_classes = classes.to_vec();
        self
    }

    #[must_use]
    pub fn with_list_shrink(mut self, shrink: bool) -> Self {
        self.list_shrink = shrink;
        self
    }
}

fn parse_seed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
