//! HashCache - an embeddable in-memory cache indexed by keyed digests
//!
//! Keys are hashed with SipHash-2-4 under a secret, the digest is split into
//! digit groups that descend a fixed-depth radix trie, and a background
//! scavenger drops entries older than the configured TTL.
//!
//! ```ignore
//! let cache = hashcache::HashCache::new("mysecret");
//! cache.write("user:1", "alice");
//! assert_eq!(cache.read("user:1"), Some(b"alice".to_vec()));
//! cache.stop().await;
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{CacheStats, DigitWidth, HashCache};
pub use config::CacheConfig;
pub use error::{ConfigError, Result};
