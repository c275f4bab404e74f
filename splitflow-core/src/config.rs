//! Plain data configuration for routers and dispatchers.
use std::{collections::HashMap, num::ParseIntError, str::FromStr};

use bon::Builder;
use envconfig::Envconfig;
use serde::{Deserialize, Serialize};

use crate::{
    errorhandling::BuildError,
    keyed::{HashKind, SlotReduction},
};

/// Traffic split settings which can be deserialized or read from the
/// environment.
///
/// Worker functions are code and therefore not part of this, pass them to
/// [Dispatcher::from_config](crate::runtime::Dispatcher::from_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct SplitConfig {
    /// Percentage of traffic per partition
    #[builder(default = vec![100])]
    pub weights: Vec<u32>,
    /// Hash function used to resolve keys
    #[builder(default)]
    pub hash: HashKind,
    /// How hashes are reduced into slots
    #[builder(default)]
    pub reduction: SlotReduction,
    /// Capacity of every partition queue, 0 means unbuffered
    #[builder(default)]
    pub queue_capacity: usize,
    /// Spread a single partition over this many workers. Only used by
    /// dispatchers and only if the weights define a single partition.
    pub worker_buckets: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig::builder().build()
    }
}

impl SplitConfig {
    /// Read the configuration from `SPLITFLOW_*` environment variables
    pub fn from_env() -> Result<Self, BuildError> {
        Ok(EnvSplitConfig::init_from_env()?.into())
    }

    /// Read the configuration from a map of `SPLITFLOW_*` variables
    pub fn from_env_map(vars: &HashMap<String, String>) -> Result<Self, BuildError> {
        Ok(EnvSplitConfig::init_from_hashmap(vars)?.into())
    }
}

#[derive(Envconfig)]
struct EnvSplitConfig {
    /// comma separated percentages, e.g. `10,20,70`
    #[envconfig(from = "SPLITFLOW_WEIGHTS", default = "100")]
    weights: WeightList,

    /// `legacy-md5` or `seahash`
    #[envconfig(from = "SPLITFLOW_HASH", default = "legacy-md5")]
    hash: HashKind,

    /// keep only the low 31 bits of every hash
    #[envconfig(from = "SPLITFLOW_LEGACY_REDUCTION", default = "true")]
    legacy_reduction: bool,

    #[envconfig(from = "SPLITFLOW_QUEUE_CAPACITY", default = "0")]
    queue_capacity: usize,

    #[envconfig(from = "SPLITFLOW_WORKER_BUCKETS")]
    worker_buckets: Option<usize>,
}

impl From<EnvSplitConfig> for SplitConfig {
    fn from(value: EnvSplitConfig) -> Self {
        let reduction = if value.legacy_reduction {
            SlotReduction::Legacy31Bit
        } else {
            SlotReduction::Full64Bit
        };
        SplitConfig {
            weights: value.weights.0,
            hash: value.hash,
            reduction,
            queue_capacity: value.queue_capacity,
            worker_buckets: value.worker_buckets,
        }
    }
}

/// Comma separated list of weights
struct WeightList(Vec<u32>);

impl FromStr for WeightList {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .map(u32::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(WeightList)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_defaults() {
        let config = SplitConfig::from_env_map(&HashMap::new()).unwrap();
        assert_eq!(config, SplitConfig::default());
        assert_eq!(config.weights, vec![100]);
        assert_eq!(config.reduction, SlotReduction::Legacy31Bit);
        assert_eq!(config.worker_buckets, None);
    }

    #[test]
    fn env_values() {
        let config = SplitConfig::from_env_map(&vars(&[
            ("SPLITFLOW_WEIGHTS", "10, 20,70"),
            ("SPLITFLOW_HASH", "seahash"),
            ("SPLITFLOW_LEGACY_REDUCTION", "false"),
            ("SPLITFLOW_QUEUE_CAPACITY", "64"),
            ("SPLITFLOW_WORKER_BUCKETS", "8"),
        ]))
        .unwrap();
        assert_eq!(config.weights, vec![10, 20, 70]);
        assert_eq!(config.hash, HashKind::Seahash);
        assert_eq!(config.reduction, SlotReduction::Full64Bit);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.worker_buckets, Some(8));
    }

    #[test]
    fn env_rejects_garbage() {
        let err = SplitConfig::from_env_map(&vars(&[("SPLITFLOW_WEIGHTS", "10,x")])).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
        let err = SplitConfig::from_env_map(&vars(&[("SPLITFLOW_HASH", "crc32")])).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    /// Missing fields fall back to their defaults
    #[test]
    fn deserialize_partial() {
        let config: SplitConfig =
            serde_json::from_str(r#"{"weights": [5, 95], "reduction": "full-64bit"}"#).unwrap();
        assert_eq!(config.weights, vec![5, 95]);
        assert_eq!(config.reduction, SlotReduction::Full64Bit);
        assert_eq!(config.hash, HashKind::LegacyMd5);
        assert_eq!(config.queue_capacity, 0);
    }

    #[test]
    fn deserialize_hash_kind() {
        let config: SplitConfig =
            serde_json::from_str(r#"{"hash": "seahash", "worker_buckets": 3}"#).unwrap();
        assert_eq!(config.hash, HashKind::Seahash);
        assert_eq!(config.worker_buckets, Some(3));
        assert_eq!(config.weights, vec![100]);
    }
}
