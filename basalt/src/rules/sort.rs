use crate::error::PlanResult;
use crate::operator::Operator::Physical;
use crate::operator::PhysicalOperator::{PhysicalLimit, PhysicalLimitingSort, PhysicalSort};
use crate::operator::LimitingSort;
use crate::plan::{PlanNode, PlanNodeRef};
use crate::planner::QueryContext;
use crate::rules::{any, pattern, Pattern, RewriteRule, RuleId};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref LIMITING_SORT_PATTERN: Pattern = {
        pattern(|op| matches!(op, Physical(PhysicalLimit(_))))
            .pattern(|op| matches!(op, Physical(PhysicalSort(_))))
                .leaf(any)
            .finish()
        .finish()
    };
}

/// Merges a limit over a sort into a sort that only keeps the top rows.
#[derive(Clone)]
pub struct LimitingSortRule {}

impl LimitingSortRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for LimitingSortRule {
    fn pattern(&self) -> &Pattern {
        &LIMITING_SORT_PATTERN
    }

    fn rule_id(&self) -> RuleId {
        RuleId::LimitingSort
    }

    fn apply(&self, node: &PlanNodeRef, _ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>> {
        let sort_node = node.input(0)?;
        let (limit, sort) = match (node.operator(), sort_node.operator()) {
            (Physical(PhysicalLimit(limit)), Physical(PhysicalSort(sort))) => (limit, sort),
            _ => return Ok(None),
        };

        let limiting_sort = LimitingSort::new(sort.order().to_vec(), limit.limit(), limit.skip());
        PlanNode::physical(
            node.group_id(),
            PhysicalLimitingSort(limiting_sort),
            vec![sort_node.input(0)?.clone()],
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use crate::cost::Cost;
    use crate::expr::SortOrder;
    use crate::operator::Operator::Physical;
    use crate::operator::PhysicalOperator::{
        PhysicalFullScan, PhysicalLimit, PhysicalLimitingSort, PhysicalSort,
    };
    use crate::operator::{EntityScan, FullScan, Limit, Sort};
    use crate::plan::PlanNode;
    use crate::rules::{LimitingSortRule, RewriteRule};
    use crate::test_utils::{column, test_catalogue, test_context};

    #[test]
    fn test_limiting_sort() {
        let catalogue = test_catalogue();
        let t2 = catalogue.entity("t2").unwrap();
        let scan = PlanNode::physical(
            0,
            PhysicalFullScan(FullScan::new(EntityScan::new(t2.clone(), t2.columns().to_vec()))),
            vec![],
        )
        .unwrap();
        let sort = PlanNode::physical(
            0,
            PhysicalSort(Sort::new(vec![(column(&t2, "id"), SortOrder::Descending)])),
            vec![scan.clone()],
        )
        .unwrap();
        let limit =
            PlanNode::physical(0, PhysicalLimit(Limit::with_skip(10, 5)), vec![sort]).unwrap();
        let ctx = test_context(limit.clone(), catalogue);
        let rule = LimitingSortRule::new();

        assert!(rule.can_apply(&limit, &ctx));
        let result = rule.apply(&limit, &ctx).unwrap().unwrap();

        match result.operator() {
            Physical(PhysicalLimitingSort(sort)) => {
                assert_eq!(10, sort.limit());
                assert_eq!(5, sort.skip());
                assert_eq!(&[(column(&t2, "id"), SortOrder::Descending)], sort.order());
            }
            op => panic!("Unexpected operator {}", op),
        }
        assert_eq!(&scan, result.input(0).unwrap());
        assert_eq!(10, result.output_size());
        assert!(result.cost().cpu > Cost::ZERO.cpu);
        assert!(result.total_cost().memory < limit.total_cost().memory);
    }
}
