use serde::{Deserialize, Serialize};

use crate::cost::CostPolicy;
use crate::error::PlanResult;

/// Planner configuration. Missing fields take their default values.
///
/// ```yaml
/// plan_cache_size: 100
/// max_partitions: 4
/// cost_policy:
///   waccuracy: 10.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Number of plans kept in the plan cache, 0 disables the cache.
    pub plan_cache_size: usize,
    /// Policy used by queries that don't bring their own.
    pub cost_policy: CostPolicy,
    /// Maximum number of partitions of a plan. 1 disables intra-query parallelism.
    pub max_partitions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            plan_cache_size: 100,
            cost_policy: CostPolicy::default(),
            max_partitions: 1,
        }
    }
}

impl PlannerConfig {
    pub fn from_yaml(yaml: &str) -> PlanResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
