use crate::error::PlanResult;
use crate::expr::Predicate;
use crate::operator::LogicalOperator::LogicalFilter;
use crate::operator::Operator::Logical;
use crate::operator::{Filter, Operator};
use crate::plan::{PlanNode, PlanNodeRef};
use crate::planner::QueryContext;
use crate::rules::{pattern, Pattern, RewriteRule, RuleId};

fn is_conjunction(op: &Operator) -> bool {
    matches!(op, Logical(LogicalFilter(f)) if matches!(f.predicate(), Predicate::And(_, _)))
}

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref CONJUNCTION_PATTERN: Pattern = {
        pattern(is_conjunction)
        .finish()
    };
}

/// Splits `Filter(a AND b)` into `Filter(b)` over `Filter(a)`, so that each part can be handled
/// on its own, e.g. answered by an index.
fn split(
    node: &PlanNodeRef,
    lower_first: bool,
) -> PlanResult<Option<PlanNodeRef>> {
    let (left, right) = match node.operator() {
        Logical(LogicalFilter(filter)) => match filter.predicate() {
            Predicate::And(left, right) => (left, right),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    let (lower, upper) = if lower_first { (left, right) } else { (right, left) };

    let input = node.input(0)?.clone();
    let lower = PlanNode::logical(
        node.group_id(),
        LogicalFilter(Filter::new((**lower).clone())),
        vec![input],
    )?;
    let upper = PlanNode::logical(
        node.group_id(),
        LogicalFilter(Filter::new((**upper).clone())),
        vec![lower],
    )?;
    Ok(Some(upper))
}

/// Evaluates the left side of a conjunction first.
#[derive(Clone)]
pub struct LeftConjunctionRule {}

impl LeftConjunctionRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for LeftConjunctionRule {
    fn pattern(&self) -> &Pattern {
        &CONJUNCTION_PATTERN
    }

    fn rule_id(&self) -> RuleId {
        RuleId::LeftConjunction
    }

    fn apply(&self, node: &PlanNodeRef, _ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>> {
        split(node, true)
    }
}

/// Evaluates the right side of a conjunction first.
#[derive(Clone)]
pub struct RightConjunctionRule {}

impl RightConjunctionRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for RightConjunctionRule {
    fn pattern(&self) -> &Pattern {
        &CONJUNCTION_PATTERN
    }

    fn rule_id(&self) -> RuleId {
        RuleId::RightConjunction
    }

    fn apply(&self, node: &PlanNodeRef, _ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>> {
        split(node, false)
    }
}
