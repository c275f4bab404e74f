//! Key based routing: hashing keys and mapping them onto partitions.
mod partition_map;
pub mod partitioners;
mod router;

pub use partition_map::{PartitionMap, PERCENT_SLOTS};
pub use partitioners::{legacy_md5_hash, seahash_key, HashFn, HashKind, SlotReduction};
pub use router::Router;
