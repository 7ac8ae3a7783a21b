use crate::error::PlanResult;
use crate::operator::LogicalOperator::{
    LogicalFilter, LogicalFunction, LogicalProjection, LogicalSort,
};
use crate::operator::Operator::Logical;
use crate::plan::PlanNodeRef;
use crate::planner::QueryContext;
use crate::rules::{any, pattern, Pattern, RewriteRule, RuleId};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref FILTER_PUSHDOWN_PATTERN: Pattern = {
        pattern(|op| matches!(op, Logical(LogicalFilter(_))))
            .pattern(|op| matches!(
                op,
                Logical(LogicalSort(_)) | Logical(LogicalProjection(_)) | Logical(LogicalFunction(_))
            ))
                .leaf(any)
            .finish()
        .finish()
    };
}

/// Moves a filter below a sort, projection or function, so fewer rows reach them.
///
/// A filter on the output column of a function stays where it is.
#[derive(Clone)]
pub struct FilterPushdownRule {}

impl FilterPushdownRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for FilterPushdownRule {
    fn pattern(&self) -> &Pattern {
        &FILTER_PUSHDOWN_PATTERN
    }

    fn rule_id(&self) -> RuleId {
        RuleId::FilterPushdown
    }

    fn apply(&self, node: &PlanNodeRef, _ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>> {
        let child = node.input(0)?;
        if let Logical(LogicalFunction(function)) = child.operator() {
            if node.requires().contains(function.out()) {
                return Ok(None);
            }
        }
        let grandchild = child.input(0)?.clone();

        let filter = node.copy_with_new_inputs(vec![grandchild])?;
        child.copy_with_new_inputs(vec![filter]).map(Some)
    }
}
