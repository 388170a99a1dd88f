//! Configuration Module
//!
//! Handles loading and validating cache settings from environment variables.

use std::env;

use crate::cache::DigitWidth;
use crate::error::{ConfigError, Result};

/// Default entry time-to-live in milliseconds
pub const DEFAULT_TTL_MS: u64 = 10_000;

/// Default scavenge interval in milliseconds
pub const DEFAULT_SCAVENGE_INTERVAL_MS: u64 = 1_000;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum age in milliseconds before an entry is eligible for scavenging
    pub ttl_ms: u64,
    /// Background scavenger wake interval in milliseconds
    pub scavenge_interval_ms: u64,
    /// Bits of digest consumed per trie level
    pub digit_width: DigitWidth,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HASHCACHE_TTL_MS` - Entry TTL in milliseconds (default: 10000)
    /// - `HASHCACHE_SCAVENGE_INTERVAL_MS` - Scavenge frequency in milliseconds (default: 1000)
    /// - `HASHCACHE_DIGIT_BITS` - Trie digit width, one of 4, 8, 16 (default: 4)
    ///
    /// The result is not validated; call [`CacheConfig::validate`] or pass it to
    /// [`crate::HashCache::with_config`].
    pub fn from_env() -> Self {
        Self {
            ttl_ms: env::var("HASHCACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_MS),
            scavenge_interval_ms: env::var("HASHCACHE_SCAVENGE_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SCAVENGE_INTERVAL_MS),
            digit_width: env::var("HASHCACHE_DIGIT_BITS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .and_then(|bits| DigitWidth::from_bits(bits).ok())
                .unwrap_or_default(),
        }
    }

    /// Checks `0 < scavenge_interval_ms <= ttl_ms`.
    pub fn validate(&self) -> Result<()> {
        validate_timing(self.ttl_ms, self.scavenge_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            scavenge_interval_ms: DEFAULT_SCAVENGE_INTERVAL_MS,
            digit_width: DigitWidth::default(),
        }
    }
}

/// Shared TTL/interval rule used by the config and the live setters.
pub(crate) fn validate_timing(ttl_ms: u64, scavenge_interval_ms: u64) -> Result<()> {
    if scavenge_interval_ms == 0 {
        return Err(ConfigError::ZeroScavengeInterval);
    }
    if scavenge_interval_ms > ttl_ms {
        return Err(ConfigError::ScavengeIntervalExceedsTtl {
            interval_ms: scavenge_interval_ms,
            ttl_ms,
        });
    }
    Ok(())
}
