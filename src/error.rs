//! Error types for the cache
//!
//! Provides configuration error handling using thiserror.

use thiserror::Error;

// == Config Error Enum ==
/// Rejected cache configuration.
///
/// Returned by the settings operations when a requested value would break
/// `0 < scavenge_interval <= ttl`. The cache keeps its previous settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Scavenge interval of zero
    #[error("scavenge interval must be greater than 0 milliseconds")]
    ZeroScavengeInterval,

    /// Scavenge interval larger than the TTL
    #[error("scavenge interval ({interval_ms} ms) must be less than or equal to the TTL ({ttl_ms} ms)")]
    ScavengeIntervalExceedsTtl { interval_ms: u64, ttl_ms: u64 },

    /// TTL smaller than the scavenge interval
    #[error("TTL ({ttl_ms} ms) must be greater than or equal to the scavenge interval ({interval_ms} ms)")]
    TtlBelowScavengeInterval { ttl_ms: u64, interval_ms: u64 },

    /// Digit-group width other than 4, 8 or 16 bits
    #[error("digit width must be 4, 8 or 16 bits, got {0}")]
    InvalidDigitWidth(u32),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_values() {
        let err = ConfigError::ScavengeIntervalExceedsTtl {
            interval_ms: 2000,
            ttl_ms: 1000,
        };
        let msg = err.to_string();
        assert!(msg.contains("2000"));
        assert!(msg.contains("1000"));

        assert_eq!(
            ConfigError::InvalidDigitWidth(5).to_string(),
            "digit width must be 4, 8 or 16 bits, got 5"
        );
    }
}
