use std::sync::Arc;

use crate::error::{PlanError, PlanResult};
use crate::operator::LogicalOperator::{
    LogicalFilter, LogicalFilterOnSubSelect, LogicalFunction, LogicalLimit, LogicalProjection,
    LogicalSample, LogicalScan, LogicalSort, LogicalUnion,
};
use crate::operator::PhysicalOperator::{
    PhysicalFilter, PhysicalFilterOnSubSelect, PhysicalFunction, PhysicalGroupRef, PhysicalLimit,
    PhysicalMerge, PhysicalProjection, PhysicalSample, PhysicalSort, PhysicalUnresolvedScan,
};
use crate::operator::{Filter, GroupRef, SubSelectFilter};
use crate::plan::{PlanInputs, PlanNode, PlanNodeRef};
use crate::planner::QueryContext;

impl PlanNode {
    /// Translates a logical tree into its naive physical counterpart.
    ///
    /// Scans become unresolved scans that access path rules still have to resolve, filters get
    /// their selectivity estimated. Non-primary inputs that belong to another group are planned
    /// separately and replaced by a reference to that group.
    pub fn implement(self: &Arc<Self>, ctx: &QueryContext) -> PlanResult<PlanNodeRef> {
        let operator = self.operator().as_logical().ok_or_else(|| {
            PlanError::IllegalState(format!("{} is not a logical operator", self.operator()))
        })?;

        let mut inputs = PlanInputs::new();
        for (idx, input) in self.inputs().iter().enumerate() {
            if idx > 0 && input.group_id() != self.group_id() {
                let reference = GroupRef::new(input.group_id(), input.columns().to_vec());
                inputs.push(PlanNode::physical(
                    input.group_id(),
                    PhysicalGroupRef(reference),
                    vec![],
                )?);
            } else {
                inputs.push(input.implement(ctx)?);
            }
        }

        let physical = match operator {
            LogicalScan(scan) => PhysicalUnresolvedScan(scan.clone()),
            LogicalSample(sample) => PhysicalSample(sample.clone()),
            LogicalFilter(filter) => {
                let selectivity = ctx.selectivity(filter.predicate(), self.base_entity());
                PhysicalFilter(Filter::with_selectivity(
                    filter.predicate().clone(),
                    selectivity,
                ))
            }
            LogicalSort(sort) => PhysicalSort(sort.clone()),
            LogicalLimit(limit) => PhysicalLimit(limit.clone()),
            LogicalProjection(projection) => PhysicalProjection(projection.clone()),
            LogicalFunction(function) => PhysicalFunction(function.clone()),
            LogicalFilterOnSubSelect(filter) => {
                let selectivity = ctx.selectivity(filter.predicate(), self.base_entity());
                PhysicalFilterOnSubSelect(SubSelectFilter::with_selectivity(
                    filter.predicate().clone(),
                    selectivity,
                ))
            }
            LogicalUnion(union) => PhysicalMerge(union.clone()),
        };

        PlanNode::physical(self.group_id(), physical, inputs)
    }
}
