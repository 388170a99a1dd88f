//! Digest Module
//!
//! Derives the keyed SipHash digest of a cache key and splits it into the
//! digit groups that select a child slot at each trie level.

use std::fmt;
use std::hash::Hasher;

use siphasher::sip::SipHasher24;

use crate::error::{ConfigError, Result};

/// Length of a normalized secret in bytes
pub const SECRET_LEN: usize = 16;

/// Width of the digest in bits
pub const DIGEST_BITS: u32 = 64;

// == Digit Width ==
/// Number of digest bits consumed per trie level.
///
/// Wider digits mean fewer levels but larger nodes: each node holds
/// `2^bits` child slots and the trie is `64 / bits` levels deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigitWidth {
    /// 4 bits: 16 slots per node, 16 levels
    #[default]
    Four,
    /// 8 bits: 256 slots per node, 8 levels
    Eight,
    /// 16 bits: 65536 slots per node, 4 levels
    Sixteen,
}

impl DigitWidth {
    /// Parses a width given in bits.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            other => Err(ConfigError::InvalidDigitWidth(other)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    /// Number of trie levels below the root.
    pub fn depth(self) -> usize {
        (DIGEST_BITS / self.bits()) as usize
    }

    /// Number of child slots per node.
    pub fn fan_out(self) -> usize {
        1 << self.bits()
    }

    fn mask(self) -> u64 {
        (1u64 << self.bits()) - 1
    }

    /// Splits a digest into its digit groups, least significant group first.
    pub fn digits(self, digest: u64) -> impl Iterator<Item = usize> {
        let bits = self.bits();
        let mask = self.mask();
        (0..self.depth()).map(move |level| ((digest >> (level as u32 * bits)) & mask) as usize)
    }
}

// == Secret ==
/// A 128-bit SipHash key.
///
/// Shorter inputs are left-padded with zero bytes, longer inputs keep only
/// their last 16 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret([u8; SECRET_LEN]);

impl Secret {
    pub fn normalize(raw: &[u8]) -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        if raw.len() >= SECRET_LEN {
            bytes.copy_from_slice(&raw[raw.len() - SECRET_LEN..]);
        } else {
            bytes[SECRET_LEN - raw.len()..].copy_from_slice(raw);
        }
        Self(bytes)
    }

    fn halves(&self) -> (u64, u64) {
        let mut k0 = [0u8; 8];
        let mut k1 = [0u8; 8];
        k0.copy_from_slice(&self.0[..8]);
        k1.copy_from_slice(&self.0[8..]);
        (u64::from_le_bytes(k0), u64::from_le_bytes(k1))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

// == Digester ==
/// Keyed SipHash-2-4 over cache keys.
#[derive(Clone)]
pub struct Digester {
    k0: u64,
    k1: u64,
}

impl Digester {
    pub fn new(secret: &Secret) -> Self {
        let (k0, k1) = secret.halves();
        Self { k0, k1 }
    }

    /// Returns the 64-bit digest of `key`.
    pub fn digest(&self, key: &[u8]) -> u64 {
        let mut hasher = SipHasher24::new_with_keys(self.k0, self.k1);
        hasher.write(key);
        hasher.finish()
    }
}

impl fmt::Debug for Digester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Digester { .. }")
    }
}
