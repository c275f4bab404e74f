use std::sync::Arc;

use bon::bon;
use tracing::info;

use crate::{config::SplitConfig, errorhandling::BuildError};

use super::{
    partitioners::{legacy_md5_hash, HashFn, SlotReduction},
    PartitionMap,
};

/// Resolves keys to partitions.
///
/// A router owns no queues, it only makes routing decisions. Use it directly
/// when you only need to know where a key goes, e.g. for A/B assignment, or
/// let a [Dispatcher](crate::runtime::Dispatcher) use it to pick a queue.
///
/// Routers are cheap to clone and can be shared freely between threads, the
/// partition table is never modified after construction.
///
/// # Example
/// ```rust
/// use splitflow::keyed::Router;
///
/// // 10% canary, 90% stable
/// let router = Router::builder().weights([10, 90]).build().unwrap();
/// let partition = router.forward("user-42");
/// assert!(partition < 2);
/// assert_eq!(partition, router.forward("user-42"));
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    map: Arc<PartitionMap>,
    hasher: HashFn,
    reduction: SlotReduction,
}

#[bon]
impl Router {
    /// Create a routing-only splitter. Worker buckets are a dispatcher concern
    /// and not available here.
    #[builder]
    pub fn new(
        /// Percentage of traffic per partition, defaults to `[100]`
        #[builder(into, default = vec![100])]
        weights: Vec<u32>,
        /// Function hashing keys, defaults to [legacy_md5_hash]
        #[builder(default = legacy_md5_hash as HashFn)]
        hasher: HashFn,
        #[builder(default)] reduction: SlotReduction,
    ) -> Result<Self, BuildError> {
        let map = PartitionMap::build(&weights, None)?;
        info!(weights = ?map.weights(), "built router");
        Ok(Self::from_parts(map, hasher, reduction))
    }
}

impl Router {
    pub(crate) fn from_parts(map: PartitionMap, hasher: HashFn, reduction: SlotReduction) -> Self {
        Self {
            map: Arc::new(map),
            hasher,
            reduction,
        }
    }

    /// Build a routing-only splitter from plain configuration.
    /// The configured worker bucket count is ignored.
    pub fn from_config(config: &SplitConfig) -> Result<Self, BuildError> {
        Router::builder()
            .weights(config.weights.clone())
            .hasher(config.hash.function())
            .reduction(config.reduction)
            .build()
    }

    /// Route only `percent` percent of all keys, see [Router::admits].
    ///
    /// The remaining traffic lands in partition 1.
    pub fn ratio(percent: u32) -> Result<Self, BuildError> {
        Router::builder().weights([percent]).build()
    }

    /// Partition the key belongs to.
    ///
    /// Deterministic for a given router: the same key always yields the same
    /// partition.
    #[inline]
    pub fn forward(&self, key: &str) -> usize {
        let hash = (self.hasher)(key);
        let slot = self.reduction.slot(hash, self.map.modulus() as u64);
        // slot < modulus, this can not truncate
        self.map.lookup(slot as usize)
    }

    /// True if the key falls into the first partition.
    ///
    /// Together with [Router::ratio] this samples a stable fraction of keys.
    #[inline]
    pub fn admits(&self, key: &str) -> bool {
        self.forward(key) == 0
    }

    /// Number of partitions keys are routed to
    pub fn partitions(&self) -> usize {
        self.map.partitions()
    }

    /// The table this router resolves slots with
    pub fn partition_map(&self) -> &PartitionMap {
        &self.map
    }
}
