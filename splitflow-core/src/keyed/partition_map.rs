//! Lookup table from hash slots to partitions.
use itertools::Itertools;
use tracing::debug;

use crate::errorhandling::BuildError;

/// Number of slots in a percentage based table
pub const PERCENT_SLOTS: usize = 100;

/// Immutable table mapping a hash slot to a partition index.
///
/// Built either from percentage weights, where partition `p` owns a contiguous
/// range of `weights[p]` slots out of 100, or in worker bucket mode, where a
/// single traffic class is spread evenly over `n` buckets and slot `i` belongs to
/// partition `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMap {
    table: Vec<usize>,
    weights: Vec<u32>,
    partitions: usize,
}

impl PartitionMap {
    /// Build a table from percentage `weights`.
    ///
    /// An empty list means `[100]`. If the weights sum to less than 100, an
    /// extra partition receives the remainder. `worker_buckets` is only honored
    /// if this leaves exactly one partition, see [PartitionMap::is_bucketed].
    pub fn build(weights: &[u32], worker_buckets: Option<usize>) -> Result<Self, BuildError> {
        let sum: u64 = weights.iter().map(|w| u64::from(*w)).sum();
        if sum > PERCENT_SLOTS as u64 {
            return Err(BuildError::InvalidWeightSum { sum });
        }
        let mut weights = weights.to_vec();
        if sum < PERCENT_SLOTS as u64 {
            // sum is at most 100 here
            weights.push(PERCENT_SLOTS as u32 - sum as u32);
        }

        match (weights.len(), worker_buckets) {
            (_, Some(0)) => Err(BuildError::ZeroWorkerBuckets),
            (1, Some(buckets)) if buckets > 1 => {
                debug!(buckets, "spreading single partition across worker buckets");
                Ok(Self {
                    table: (0..buckets).collect(),
                    weights,
                    partitions: buckets,
                })
            }
            (partitions, buckets) => {
                if buckets.is_some_and(|b| b > 1) {
                    debug!(
                        partitions,
                        "ignoring worker bucket count, weights define the partitions"
                    );
                }
                let table = weights
                    .iter()
                    .enumerate()
                    .flat_map(|(partition, weight)| itertools::repeat_n(partition, *weight as usize))
                    .collect_vec();
                debug!(?weights, "built percentage partition table");
                Ok(Self {
                    table,
                    weights,
                    partitions,
                })
            }
        }
    }

    /// Partition owning the given slot.
    ///
    /// **PANIC:** if `slot >= self.modulus()`
    #[inline]
    pub fn lookup(&self, slot: usize) -> usize {
        self.table[slot]
    }

    /// Number of slots, i.e. the value hashes are reduced modulo
    #[inline]
    pub fn modulus(&self) -> usize {
        self.table.len()
    }

    /// Number of partitions, including ones with a weight of zero
    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Normalized weights, including the implicit remainder partition
    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// True if this table spreads a single traffic class over worker buckets
    /// instead of laying out percentages
    pub fn is_bucketed(&self) -> bool {
        self.weights.len() == 1 && self.partitions > 1
    }
}
