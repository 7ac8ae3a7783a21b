use crate::error::PlanResult;
use crate::operator::Operator::Physical;
use crate::operator::PhysicalOperator::{PhysicalFullScan, PhysicalUnresolvedScan};
use crate::operator::FullScan;
use crate::plan::PlanNodeRef;
use crate::planner::QueryContext;
use crate::rules::{pattern, Pattern, RewriteRule, RuleId};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref FULL_SCAN_PATTERN: Pattern = {
        pattern(|op| matches!(op, Physical(PhysicalUnresolvedScan(_))))
        .finish()
    };
}

/// Resolves a scan by reading the whole entity.
#[derive(Clone)]
pub struct FullScanRule {}

impl FullScanRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for FullScanRule {
    fn pattern(&self) -> &Pattern {
        &FULL_SCAN_PATTERN
    }

    fn rule_id(&self) -> RuleId {
        RuleId::FullScan
    }

    fn apply(&self, node: &PlanNodeRef, _ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>> {
        match node.operator() {
            Physical(PhysicalUnresolvedScan(scan)) => node
                .copy_with_operator(Physical(PhysicalFullScan(FullScan::new(scan.clone()))))
                .map(Some),
            _ => Ok(None),
        }
    }
}
