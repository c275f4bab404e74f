//! Hash functions turning string keys into slots of a [PartitionMap](super::PartitionMap).
//!
//! Any `fn(&str) -> u64` can be used as a hash function. It must be pure and
//! deterministic for the lifetime of the process, it does not need to be
//! cryptographically secure.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A function mapping a key to a wide unsigned integer
pub type HashFn = fn(&str) -> u64;

/// Hash a key the way historical deployments did, so existing partition
/// assignments stay where they are.
///
/// Takes the MD5 digest of the key and assembles its first four bytes with
/// byte 3 as the most significant one. The digest is computed fresh on every call,
/// no hasher state is shared between callers.
pub fn legacy_md5_hash(key: &str) -> u64 {
    let md5::Digest(digest) = md5::compute(key.as_bytes());
    let head = [digest[0], digest[1], digest[2], digest[3]];
    // historically this went through a signed 32 bit integer, reading it as
    // unsigned keeps every bit
    u64::from(u32::from_le_bytes(head))
}

/// Stable [seahash](https://docs.rs/seahash) of the key.
///
/// Faster and better distributed than [legacy_md5_hash], but places keys in
/// different partitions. Use this for new deployments.
pub fn seahash_key(key: &str) -> u64 {
    seahash::hash(key.as_bytes())
}

/// How a raw hash is reduced before taking it modulo the slot count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotReduction {
    /// Keep only the low 31 bits, matching historical slot assignments
    #[default]
    #[serde(rename = "legacy-31bit")]
    Legacy31Bit,
    /// Use the full 64 bit hash
    #[serde(rename = "full-64bit")]
    Full64Bit,
}

impl SlotReduction {
    /// Reduce `hash` into `0..modulus`.
    ///
    /// **PANIC:** if `modulus` is zero
    #[inline]
    pub fn slot(&self, hash: u64, modulus: u64) -> u64 {
        match self {
            SlotReduction::Legacy31Bit => (hash & 0x7fff_ffff) % modulus,
            SlotReduction::Full64Bit => hash % modulus,
        }
    }
}

/// Named hash functions, so they can be selected from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashKind {
    /// [legacy_md5_hash]
    #[default]
    LegacyMd5,
    /// [seahash_key]
    Seahash,
}

impl HashKind {
    /// The hash function this kind names
    pub fn function(&self) -> HashFn {
        match self {
            HashKind::LegacyMd5 => legacy_md5_hash,
            HashKind::Seahash => seahash_key,
        }
    }
}

/// Error parsing a [HashKind] from a string
#[derive(Debug, thiserror::Error)]
#[error("unknown hash function '{0}', expected 'legacy-md5' or 'seahash'")]
pub struct UnknownHashKind(String);

impl FromStr for HashKind {
    type Err = UnknownHashKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "legacy-md5" | "md5" => Ok(HashKind::LegacyMd5),
            "seahash" => Ok(HashKind::Seahash),
            other => Err(UnknownHashKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Values computed from the MD5 digests of the keys
    #[test]
    fn legacy_hash_known_answers() {
        assert_eq!(legacy_md5_hash(""), 3649838548);
        assert_eq!(legacy_md5_hash("a"), 3111502092);
        assert_eq!(legacy_md5_hash("abc"), 2555380112);
        assert_eq!(legacy_md5_hash("user-42"), 129773942);
        assert_eq!(legacy_md5_hash("hello"), 708854109);
    }

    #[test]
    fn legacy_hash_fits_u32() {
        for key in ["", "a", "some much longer key with spaces", "ünïcödé"] {
            assert!(legacy_md5_hash(key) <= u64::from(u32::MAX));
        }
    }

    /// The 31 bit reduction must drop the sign bit before the modulo
    #[test]
    fn legacy_reduction_masks_sign_bit() {
        let hash = legacy_md5_hash("abc");
        assert_eq!(SlotReduction::Legacy31Bit.slot(hash, 100), 64);
        assert_eq!(SlotReduction::Full64Bit.slot(hash, 100), 2555380112 % 100);
        assert_eq!(SlotReduction::Legacy31Bit.slot(legacy_md5_hash(""), 100), 0);
        assert_eq!(SlotReduction::Legacy31Bit.slot(legacy_md5_hash("user-42"), 100), 42);
    }

    #[test]
    fn seahash_is_stable() {
        assert_eq!(seahash_key("user-42"), seahash_key("user-42"));
        assert_ne!(seahash_key("user-42"), seahash_key("user-43"));
    }

    #[test]
    fn parse_hash_kind() {
        assert_eq!("seahash".parse::<HashKind>().unwrap(), HashKind::Seahash);
        assert_eq!(" legacy-md5 ".parse::<HashKind>().unwrap(), HashKind::LegacyMd5);
        assert!("sha1".parse::<HashKind>().is_err());
    }
}
