//! Cache Module
//!
//! Keyed-digest radix trie cache with TTL scavenging.

mod digest;
mod index;
mod registry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use digest::{Digester, DigitWidth, Secret, DIGEST_BITS, SECRET_LEN};
pub use stats::CacheStats;
pub use store::HashCache;

pub(crate) use index::{NodeId, RadixIndex};
pub(crate) use registry::{LeafEntry, LeafRegistry};
pub(crate) use stats::StatsCounters;
pub(crate) use store::CacheShared;
