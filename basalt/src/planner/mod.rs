//! Cost based planner.
//!
//! Planning a query runs, for each group of the query, three stages:
//!
//! 1. Logical rules rewrite the logical plan into a set of equivalent logical plans.
//! 2. Each logical plan is implemented as a naive physical plan, which physical rules turn into
//! a set of alternative executable plans, e.g. using different access paths.
//! 3. The candidates are ranked by the [`CostPolicy`] of the query, after normalizing their
//! costs against each other.
//!
//! Sub-queries are planned as groups of their own and the winners are composed into the plan of
//! the main query afterwards. The selected plan is cached by the digest of the logical plan.
//!
//! [`CostPolicy`]: crate::cost::CostPolicy
mod cache;
pub use cache::*;
mod context;
pub use context::*;
mod explain;
pub use explain::*;
mod explorer;
pub use explorer::*;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::debug;

use crate::catalog::Catalogue;
use crate::config::PlannerConfig;
use crate::cost::{Cost, CostPolicy, NormalizedCost};
use crate::error::{illegal_state, PlanError, PlanResult};
use crate::operator::Operator::Physical;
use crate::operator::PhysicalOperator::PhysicalGroupRef;
use crate::plan::{GroupId, Plan, PlanNodeRef};
use crate::rules::{default_logical_rules, default_physical_rules, RuleImpl};

/// A physical plan with its normalized cost and score among the candidates of its group.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    pub plan: Plan,
    pub normalized: NormalizedCost,
    /// Lower is better.
    pub score: f64,
}

/// Plans queries, owning the rule sets and the plan cache shared by all queries.
///
/// A planner can be shared between threads. Each query brings its own [`QueryContext`].
pub struct QueryPlanner {
    logical_rules: Vec<RuleImpl>,
    physical_rules: Vec<RuleImpl>,
    cache: PlanCache,
    config: PlannerConfig,
}

impl QueryPlanner {
    pub fn new(
        logical_rules: Vec<RuleImpl>,
        physical_rules: Vec<RuleImpl>,
        plan_cache_size: usize,
    ) -> Self {
        Self {
            logical_rules,
            physical_rules,
            cache: PlanCache::new(plan_cache_size),
            config: PlannerConfig {
                plan_cache_size,
                ..Default::default()
            },
        }
    }

    /// Planner with the default rule sets.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            logical_rules: default_logical_rules(),
            physical_rules: default_physical_rules(),
            cache: PlanCache::new(config.plan_cache_size),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn cache(&self) -> &PlanCache {
        &self.cache
    }

    /// Context for planning `logical`, using the configured cost policy.
    pub fn new_context(&self, logical: PlanNodeRef, catalogue: Arc<dyn Catalogue>) -> QueryContext {
        QueryContext::new(logical, catalogue).with_policy(self.config.cost_policy.clone())
    }

    /// Plans the query of `ctx` and returns the best executable plan.
    ///
    /// Fails with [`PlanError::Unplannable`] if a group has no executable candidate. The plan
    /// cache isn't modified in that case. Queries with disabled rules neither read nor populate
    /// the cache, since it is keyed by the logical plan alone.
    pub fn plan_and_select(&self, ctx: &QueryContext) -> PlanResult<Plan> {
        let logical = ctx.logical();
        let cacheable = !ctx.has_disabled_rules();
        if cacheable && !ctx.is_bypass_cache() {
            if let Some(plan) = self.cache.get(logical) {
                debug!("Plan cache hit for {:016x}", logical.digest());
                return Ok(plan);
            }
            debug!("Plan cache miss for {:016x}", logical.digest());
        }

        let groups = self.plan(ctx, 1)?;
        let winners: BTreeMap<GroupId, PlanNodeRef> = groups
            .iter()
            .filter_map(|(group_id, candidates)| {
                candidates.first().map(|c| (*group_id, c.plan.root()))
            })
            .collect();
        let root = match winners.get(&logical.group_id()) {
            Some(root) => root.clone(),
            None => return Err(PlanError::Unplannable {
                group_id: logical.group_id(),
            }),
        };

        let plan = Plan::new(compose(&root, &winners, &mut vec![logical.group_id()])?);
        debug!(
            "Selected plan {:016x} for {:016x}",
            plan.digest(),
            logical.digest()
        );

        if cacheable && ctx.is_cache() {
            self.cache.insert(logical.clone(), plan.clone());
        }
        Ok(plan)
    }

    /// Plans all groups of the query of `ctx`, returning at most `limit` candidates per group,
    /// best first.
    pub fn plan(
        &self,
        ctx: &QueryContext,
        limit: usize,
    ) -> PlanResult<BTreeMap<GroupId, Vec<ScoredCandidate>>> {
        let mut groups = BTreeMap::new();
        self.plan_group(ctx.logical(), ctx, limit, &mut groups)?;
        Ok(groups)
    }

    /// Ranks all candidates of all groups, without touching the plan cache.
    pub fn explain(&self, ctx: &QueryContext) -> PlanResult<Explanation> {
        self.plan(ctx, usize::MAX).map(Explanation::new)
    }

    /// Splits `plan` into partitions executed in parallel, if the cost policy of `ctx` deems it
    /// worth it. Returns `plan` unchanged otherwise.
    pub fn partition(&self, plan: &Plan, ctx: &QueryContext) -> PlanResult<Plan> {
        Ok(plan
            .try_partition(ctx.policy(), self.config.max_partitions)?
            .unwrap_or_else(|| plan.clone()))
    }

    /// Removes the cached plan of the logical plan with `digest`.
    pub fn invalidate(&self, digest: u64) -> bool {
        self.cache.invalidate(digest)
    }

    /// Removes all cached plans using `index` of `entity`, e.g. after the index was dropped.
    pub fn invalidate_index(&self, entity: &str, index: &str) -> usize {
        self.cache.invalidate_if(|plan| plan.uses_index(entity, index))
    }

    /// Removes all cached plans reading `entity`, e.g. after its schema changed.
    pub fn invalidate_entity(&self, entity: &str) -> usize {
        self.cache.invalidate_if(|plan| plan.uses_entity(entity))
    }

    pub fn clear(&self) {
        self.cache.clear()
    }

    fn plan_group(
        &self,
        root: &PlanNodeRef,
        ctx: &QueryContext,
        limit: usize,
        groups: &mut BTreeMap<GroupId, Vec<ScoredCandidate>>,
    ) -> PlanResult<()> {
        let group_id = root.group_id();
        if groups.contains_key(&group_id) {
            return Ok(());
        }

        let logical = Explorer::new(Stage::Logical, &self.logical_rules, ctx).explore(root)?;

        let mut seen = HashSet::new();
        let mut physical = vec![];
        for candidate in &logical.candidates {
            let implemented = candidate.implement(ctx)?;
            let exploration =
                Explorer::new(Stage::Physical, &self.physical_rules, ctx).explore(&implemented)?;
            for plan in exploration.candidates {
                if seen.insert(plan.digest()) {
                    physical.push(plan);
                }
            }
        }
        debug!(
            "Group {}: {} logical and {} physical candidates",
            group_id,
            logical.candidates.len(),
            physical.len()
        );

        for subquery in logical.deferred.values() {
            self.plan_group(subquery, ctx, limit, groups)?;
        }

        let mut ranked = rank(physical, ctx.policy());
        if ranked.is_empty() {
            return Err(PlanError::Unplannable { group_id });
        }
        ranked.truncate(limit.max(1));
        groups.insert(group_id, ranked);
        Ok(())
    }
}

/// Scores candidates by their normalized total cost. Candidates that can't be costed are
/// dropped; ties keep discovery order.
fn rank(candidates: Vec<PlanNodeRef>, policy: &CostPolicy) -> Vec<ScoredCandidate> {
    let candidates: Vec<PlanNodeRef> = candidates
        .into_iter()
        .filter(|c| !c.total_cost().is_invalid())
        .collect();
    let costs: Vec<Cost> = candidates.iter().map(|c| c.total_cost()).collect();

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .zip(NormalizedCost::normalize(&costs))
        .map(|(node, normalized)| ScoredCandidate {
            score: policy.to_score(&normalized),
            plan: Plan::new(node),
            normalized,
        })
        .collect();
    scored.sort_by(|a, b| a.score.total_cmp(&b.score));
    scored
}

/// Replaces group references in `node` by the winner of the referenced group.
///
/// `path` holds the groups being composed, to detect groups referencing themselves.
fn compose(
    node: &PlanNodeRef,
    winners: &BTreeMap<GroupId, PlanNodeRef>,
    path: &mut Vec<GroupId>,
) -> PlanResult<PlanNodeRef> {
    if let Physical(PhysicalGroupRef(reference)) = node.operator() {
        let group_id = reference.group_id();
        if path.contains(&group_id) {
            return illegal_state(format!("group {} references itself", group_id));
        }
        let winner = winners
            .get(&group_id)
            .ok_or_else(|| PlanError::IllegalState(format!("no plan for group {}", group_id)))?;
        path.push(group_id);
        let composed = compose(winner, winners, path)?;
        path.pop();
        return Ok(composed);
    }

    let inputs = node
        .inputs()
        .iter()
        .map(|input| compose(input, winners, path))
        .collect::<PlanResult<Vec<_>>>()?;
    if inputs
        .iter()
        .zip(node.inputs())
        .all(|(new, old)| Arc::ptr_eq(new, old))
    {
        Ok(node.clone())
    } else {
        node.copy_with_new_inputs(inputs)
    }
}
