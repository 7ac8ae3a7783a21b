use std::sync::Arc;

use enumset::EnumSet;

use crate::catalog::{Catalogue, EntityRef};
use crate::cost::CostPolicy;
use crate::expr::{BindingContext, Predicate};
use crate::plan::PlanNodeRef;
use crate::rules::RuleId;
use crate::stat::{NaiveSelectivityCalculator, Selectivity, StatisticsService};

/// Context of planning a single query.
///
/// Holds the logical plan to optimize, the cost policy used to rank candidates, and access to
/// catalogue and statistics. Each planning invocation gets its own context.
#[derive(Clone)]
pub struct QueryContext {
    logical: PlanNodeRef,
    policy: CostPolicy,
    bindings: BindingContext,
    catalogue: Arc<dyn Catalogue>,
    statistics: Arc<dyn StatisticsService>,
    /// Query hints.
    disabled_rules: EnumSet<RuleId>,
    bypass_cache: bool,
    cache: bool,
}

impl QueryContext {
    pub fn new(logical: PlanNodeRef, catalogue: Arc<dyn Catalogue>) -> Self {
        Self {
            logical,
            policy: CostPolicy::default(),
            bindings: BindingContext::new(),
            catalogue,
            statistics: Arc::new(NaiveSelectivityCalculator),
            disabled_rules: EnumSet::empty(),
            bypass_cache: false,
            cache: true,
        }
    }

    pub fn with_policy(mut self, policy: CostPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_bindings(mut self, bindings: BindingContext) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_statistics(mut self, statistics: Arc<dyn StatisticsService>) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_disabled_rules(mut self, rules: EnumSet<RuleId>) -> Self {
        self.disabled_rules = rules;
        self
    }

    /// Skips the plan cache lookup.
    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Whether the selected plan is stored in the plan cache.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn logical(&self) -> &PlanNodeRef {
        &self.logical
    }

    pub fn policy(&self) -> &CostPolicy {
        &self.policy
    }

    pub fn bindings(&self) -> &BindingContext {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut BindingContext {
        &mut self.bindings
    }

    pub fn catalogue(&self) -> &dyn Catalogue {
        &*self.catalogue
    }

    pub fn is_enabled(&self, rule: RuleId) -> bool {
        !self.disabled_rules.contains(rule)
    }

    pub fn has_disabled_rules(&self) -> bool {
        !self.disabled_rules.is_empty()
    }

    pub fn is_bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    pub fn is_cache(&self) -> bool {
        self.cache
    }

    pub fn selectivity(&self, predicate: &Predicate, entity: Option<&EntityRef>) -> Selectivity {
        self.statistics
            .selectivity(predicate, entity.map(|e| &**e))
    }
}

#[cfg(test)]
mod tests {
    use enumset::enum_set;

    use crate::expr::{BindingContext, ComparisonOperator, Predicate, Value};
    use crate::planner::QueryContext;
    use crate::rules::RuleId;
    use crate::stat::Selectivity;
    use crate::test_utils::{column, eq_predicate, test_catalogue, test_entity};
    use crate::plan::LogicalPlanBuilder;

    #[test]
    fn test_query_hints() {
        let catalogue = test_catalogue();
        let plan = LogicalPlanBuilder::new(catalogue.clone())
            .scan("t1")
            .build()
            .unwrap();
        let ctx = QueryContext::new(plan.root(), catalogue)
            .with_disabled_rules(enum_set!(RuleId::IndexScan | RuleId::KnnIndexScan));

        assert!(!ctx.is_enabled(RuleId::IndexScan));
        assert!(!ctx.is_enabled(RuleId::KnnIndexScan));
        assert!(ctx.is_enabled(RuleId::FullScan));
        assert!(ctx.has_disabled_rules());
        assert!(ctx.is_cache());
        assert!(!ctx.is_bypass_cache());
    }

    #[test]
    fn test_selectivity_uses_statistics() {
        let catalogue = test_catalogue();
        let entity = test_entity("t2", 1000);
        let plan = LogicalPlanBuilder::new(catalogue.clone())
            .scan("t2")
            .build()
            .unwrap();
        let ctx = QueryContext::new(plan.root(), catalogue);

        let predicate = eq_predicate(&entity, "id", 0);
        assert_eq!(Selectivity::new(0.001), ctx.selectivity(&predicate, Some(&entity)));
        assert_eq!(Selectivity::new(0.1), ctx.selectivity(&predicate, None));
    }

    #[test]
    fn test_bindings_are_late() {
        let catalogue = test_catalogue();
        let t1 = catalogue.entity("t1").unwrap();
        let mut bindings = BindingContext::new();
        let literal = bindings.bind(Value::Int(42));
        let plan = LogicalPlanBuilder::new(catalogue.clone())
            .scan("t1")
            .filter(Predicate::comparison(
                column(&t1, "x"),
                ComparisonOperator::Equal,
                vec![literal.clone()],
            ))
            .build()
            .unwrap();

        let ctx = QueryContext::new(plan.root(), catalogue).with_bindings(bindings);
        assert_eq!(&Value::Int(42), ctx.bindings().get(0).unwrap());

        // Rebinding changes the value, not the plan.
        let mut ctx = ctx;
        ctx.bindings_mut().update(&literal, Value::Int(7)).unwrap();
        assert_eq!(&Value::Int(7), ctx.bindings().get(0).unwrap());
        assert_eq!(plan.root().digest(), ctx.logical().digest());
    }
}
