use log::debug;

use crate::cost::CostPolicy;
use crate::error::PlanResult;
use crate::operator::Operator::Physical;
use crate::operator::PhysicalOperator::{PhysicalFullScan, PhysicalMerge};
use crate::operator::{FullScan, Partition, Union};
use crate::plan::{Plan, PlanNode, PlanNodeRef};

impl Plan {
    /// Splits the pipeline on top of a full scan into partitions executed in parallel.
    ///
    /// The pipeline is the longest chain of partitionable operators starting at the base of the
    /// plan. It is copied once per partition, each copy scanning one partition of the entity,
    /// and the copies are merged. The number of partitions is chosen by
    /// [`CostPolicy::parallelisation`]. Returns `None` if the plan is not worth partitioning.
    pub fn try_partition(&self, policy: &CostPolicy, max_partitions: usize) -> PlanResult<Option<Plan>> {
        // Nodes along the primary path, from root to base.
        let mut path_nodes: Vec<PlanNodeRef> = vec![self.root()];
        while let Some(input) = path_nodes.last().and_then(|n| n.inputs().first().cloned()) {
            path_nodes.push(input);
        }

        let top = match path_nodes.iter().rposition(|n| !n.partitionable()) {
            Some(idx) => idx + 1,
            None => 0,
        };
        if top >= path_nodes.len() {
            return Ok(None);
        }

        let base = &path_nodes[path_nodes.len() - 1];
        let scan = match base.operator() {
            Physical(PhysicalFullScan(scan)) => scan,
            _ => return Ok(None),
        };

        let pipeline = &path_nodes[top];
        let partitions = policy.parallelisation(
            &pipeline.total_cost(),
            &self.root.total_cost(),
            max_partitions,
        );
        if partitions <= 1 {
            return Ok(None);
        }
        debug!(
            "Partitioning pipeline at depth {} of plan {} into {} partitions.",
            top,
            self.digest(),
            partitions
        );

        let mut copies = Vec::with_capacity(partitions);
        for index in 0..partitions {
            let partition = Partition {
                index,
                count: partitions,
            };
            let mut node = PlanNode::physical(
                base.group_id(),
                PhysicalFullScan(FullScan::with_partition(scan.scan().clone(), partition)),
                vec![],
            )?;
            for original in path_nodes[top..path_nodes.len() - 1].iter().rev() {
                node = original.copy_with_new_inputs(vec![node])?;
            }
            copies.push(node);
        }

        let merge = PlanNode::physical(pipeline.group_id(), PhysicalMerge(Union::new()), copies)?;
        let path = vec![0; top];
        Ok(Some(Plan::new(self.root.replace_at(&path, merge)?)))
    }
}
