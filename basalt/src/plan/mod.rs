//! Plan trees the planner works on.
//!
//! A plan is a tree of immutable [`PlanNode`]s shared through [`PlanNodeRef`]s. Rules never
//! modify a node; they create new nodes that share unchanged subtrees with the original, and
//! [`PlanNode::replace_at`] rebuilds the path from a replaced node up to the root.
//!
//! Every node belongs to a group, and all nodes of a group compute the same result. A logical
//! query consisting of a main query and sub-queries uses different groups for each of them.

mod explain;
pub use explain::*;
mod implement;
mod logical;
pub use logical::*;
mod partition;
mod visit;
pub use visit::*;

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::catalog::{ColumnDef, EntityRef};
use crate::cost::{Cost, CostModel};
use crate::error::{illegal_state, PlanError, PlanResult};
use crate::operator::LogicalOperator::{LogicalSample, LogicalScan};
use crate::operator::Operator::{Logical, Physical};
use crate::operator::PhysicalOperator::{
    PhysicalFullScan, PhysicalIndexScan, PhysicalSample, PhysicalUnresolvedScan,
};
use crate::operator::{Arity, LogicalOperator, Operator, PhysicalOperator};

pub type GroupId = u32;

/// Structural hash of a plan tree.
pub type Digest = u64;

pub type PlanNodeRef = Arc<PlanNode>;

pub type PlanInputs = SmallVec<[PlanNodeRef; 2]>;

/// Properties of a physical node, derived when the node is created.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalProperties {
    /// Estimated number of rows produced.
    pub output_size: u64,
    /// Cost of this operator alone.
    pub cost: Cost,
    /// Cost of this operator and all its inputs.
    pub total_cost: Cost,
    /// Whether this node and all its inputs can be executed.
    pub executable: bool,
    pub partitionable: bool,
}

/// One node in a plan.
#[derive(Debug)]
pub struct PlanNode {
    group_id: GroupId,
    operator: Operator,
    inputs: PlanInputs,
    digest: Digest,
    columns: Vec<ColumnDef>,
    requires: Vec<ColumnDef>,
    physical: Option<PhysicalProperties>,
}

/// Two nodes are equal if they have the same group, operator and inputs. Derived properties
/// are ignored.
impl PartialEq for PlanNode {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
            && self.group_id == other.group_id
            && self.operator == other.operator
            && self.inputs == other.inputs
    }
}

impl Eq for PlanNode {}

impl PlanNode {
    /// Creates a new node, checking the number and family of its inputs.
    pub fn new<I>(group_id: GroupId, operator: Operator, inputs: I) -> PlanResult<PlanNodeRef>
    where
        I: IntoIterator<Item = PlanNodeRef>,
    {
        let inputs: PlanInputs = inputs.into_iter().collect();

        let arity = operator.arity();
        if !arity.accepts(inputs.len()) {
            return illegal_state(format!(
                "{} expects {:?} inputs, got {}",
                operator.name(),
                arity,
                inputs.len()
            ));
        }

        let logical = matches!(operator, Logical(_));
        if let Some(input) = inputs.iter().find(|i| i.is_logical() != logical) {
            return illegal_state(format!(
                "{} can't have {} as input",
                operator.name(),
                input.operator.name()
            ));
        }

        let physical = match &operator {
            Physical(op) => Some(CostModel::default().estimate(op, &inputs)),
            Logical(_) => None,
        };

        Ok(Arc::new(Self {
            digest: digest_of(group_id, &operator, &inputs),
            columns: operator.derive_columns(&inputs),
            requires: operator.requires(),
            group_id,
            operator,
            inputs,
            physical,
        }))
    }

    pub fn logical<I>(group_id: GroupId, operator: LogicalOperator, inputs: I) -> PlanResult<PlanNodeRef>
    where
        I: IntoIterator<Item = PlanNodeRef>,
    {
        Self::new(group_id, Logical(operator), inputs)
    }

    pub fn physical<I>(group_id: GroupId, operator: PhysicalOperator, inputs: I) -> PlanResult<PlanNodeRef>
    where
        I: IntoIterator<Item = PlanNodeRef>,
    {
        Self::new(group_id, Physical(operator), inputs)
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn inputs(&self) -> &[PlanNodeRef] {
        &self.inputs
    }

    pub fn input(&self, idx: usize) -> PlanResult<&PlanNodeRef> {
        self.inputs.get(idx).ok_or_else(|| {
            PlanError::IllegalState(format!("{} has no input {}", self.operator.name(), idx))
        })
    }

    pub fn arity(&self) -> Arity {
        self.operator.arity()
    }

    /// Structural hash of the subtree rooted at this node.
    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Columns produced by this node.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Columns this node reads from its inputs.
    pub fn requires(&self) -> &[ColumnDef] {
        &self.requires
    }

    pub fn is_logical(&self) -> bool {
        matches!(self.operator, Logical(_))
    }

    pub fn physical_properties(&self) -> Option<&PhysicalProperties> {
        self.physical.as_ref()
    }

    /// Whether the subtree can be executed. Logical nodes are never executable.
    pub fn executable(&self) -> bool {
        self.physical.as_ref().map(|p| p.executable).unwrap_or(false)
    }

    pub fn partitionable(&self) -> bool {
        self.physical
            .as_ref()
            .map(|p| p.partitionable)
            .unwrap_or(false)
    }

    pub fn output_size(&self) -> u64 {
        self.physical.as_ref().map(|p| p.output_size).unwrap_or(0)
    }

    /// Cost of this node alone, [`Cost::INVALID`] for logical nodes.
    pub fn cost(&self) -> Cost {
        self.physical
            .as_ref()
            .map(|p| p.cost)
            .unwrap_or(Cost::INVALID)
    }

    /// Cost of the subtree, [`Cost::INVALID`] for logical nodes.
    pub fn total_cost(&self) -> Cost {
        self.physical
            .as_ref()
            .map(|p| p.total_cost)
            .unwrap_or(Cost::INVALID)
    }

    /// The nullary node reached by following the first input.
    pub fn base(&self) -> &PlanNode {
        let mut node = self;
        while let Some(input) = node.inputs.first() {
            node = input;
        }
        node
    }

    /// The entity the base of this subtree reads from, if any.
    pub fn base_entity(&self) -> Option<&EntityRef> {
        match &self.base().operator {
            Logical(LogicalScan(scan)) | Physical(PhysicalUnresolvedScan(scan)) => {
                Some(scan.entity())
            }
            Logical(LogicalSample(sample)) | Physical(PhysicalSample(sample)) => {
                Some(sample.entity())
            }
            Physical(PhysicalFullScan(scan)) => Some(scan.entity()),
            Physical(PhysicalIndexScan(scan)) => Some(scan.entity()),
            _ => None,
        }
    }

    /// Creates a node with the same group and operator, but new inputs.
    pub fn copy_with_new_inputs<I>(&self, inputs: I) -> PlanResult<PlanNodeRef>
    where
        I: IntoIterator<Item = PlanNodeRef>,
    {
        Self::new(self.group_id, self.operator.clone(), inputs)
    }

    /// Creates a node with the same group and inputs, but another operator.
    pub fn copy_with_operator(&self, operator: Operator) -> PlanResult<PlanNodeRef> {
        Self::new(self.group_id, operator, self.inputs.iter().cloned())
    }

    /// Node reached from this node by following `path`, a list of input indexes.
    pub fn node_at(self: &Arc<Self>, path: &[usize]) -> PlanResult<PlanNodeRef> {
        let mut node = self.clone();
        for idx in path {
            node = node.input(*idx)?.clone();
        }
        Ok(node)
    }

    /// Replaces the node at `path` with `replacement` and returns the new root.
    ///
    /// Nodes off the path are shared with the original tree. Nodes on the path are copied with
    /// new inputs, so their digests and physical properties are derived again.
    pub fn replace_at(
        self: &Arc<Self>,
        path: &[usize],
        replacement: PlanNodeRef,
    ) -> PlanResult<PlanNodeRef> {
        match path.split_first() {
            None => Ok(replacement),
            Some((idx, rest)) => {
                let child = self.input(*idx)?.replace_at(rest, replacement)?;
                let mut inputs = self.inputs.clone();
                inputs[*idx] = child;
                self.copy_with_new_inputs(inputs)
            }
        }
    }
}

impl Display for PlanNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.operator)
    }
}

fn digest_of(group_id: GroupId, operator: &Operator, inputs: &[PlanNodeRef]) -> Digest {
    let mut hasher = DefaultHasher::new();
    group_id.hash(&mut hasher);
    operator.hash(&mut hasher);
    for input in inputs {
        input.digest.hash(&mut hasher);
    }
    hasher.finish()
}

/// A query plan.
#[derive(Clone, PartialEq, Debug)]
pub struct Plan {
    root: PlanNodeRef,
}

/// Breadth first iterator of a plan.
struct BFSPlanNodeIter {
    queue: VecDeque<PlanNodeRef>,
}

impl Iterator for BFSPlanNodeIter {
    type Item = PlanNodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.inputs.iter().cloned());
        Some(node)
    }
}

impl Plan {
    pub fn new(root: PlanNodeRef) -> Self {
        Self { root }
    }

    pub fn root(&self) -> PlanNodeRef {
        self.root.clone()
    }

    pub fn digest(&self) -> Digest {
        self.root.digest
    }

    pub fn bfs_iterator(&self) -> impl Iterator<Item = PlanNodeRef> {
        BFSPlanNodeIter {
            queue: VecDeque::from([self.root.clone()]),
        }
    }

    /// Whether any node of this plan scans `index` of `entity`.
    pub fn uses_index(&self, entity: &str, index: &str) -> bool {
        self.bfs_iterator().any(|node| match node.operator() {
            Physical(PhysicalIndexScan(scan)) => {
                scan.entity().name() == entity && scan.index().name() == index
            }
            _ => false,
        })
    }

    /// Whether any node of this plan reads `entity`.
    pub fn uses_entity(&self, entity: &str) -> bool {
        self.bfs_iterator().any(|node| {
            node.inputs().is_empty()
                && node
                    .base_entity()
                    .map(|e| e.name() == entity)
                    .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::PlanError;
    use crate::operator::LogicalOperator::{LogicalFilter, LogicalLimit, LogicalScan};
    use crate::operator::PhysicalOperator::PhysicalLimit;
    use crate::operator::{EntityScan, Filter, Limit};
    use crate::plan::PlanNode;
    use crate::test_utils::{eq_predicate, test_entity};

    #[test]
    fn test_arity_is_checked() {
        let entity = test_entity("t1", 100);
        let scan = PlanNode::logical(
            0,
            LogicalScan(EntityScan::new(entity.clone(), entity.columns().to_vec())),
            vec![],
        )
        .unwrap();

        let result = PlanNode::logical(0, LogicalLimit(Limit::new(1)), vec![]);
        assert!(matches!(result, Err(PlanError::IllegalState(_))));

        let result = PlanNode::logical(0, LogicalLimit(Limit::new(1)), vec![scan.clone(), scan.clone()]);
        assert!(matches!(result, Err(PlanError::IllegalState(_))));

        let result = PlanNode::physical(0, PhysicalLimit(Limit::new(1)), vec![scan]);
        assert!(matches!(result, Err(PlanError::IllegalState(_))));
    }

    #[test]
    fn test_digest_is_structural() {
        let entity = test_entity("t1", 100);
        let build = |limit: u64| {
            let scan = PlanNode::logical(
                0,
                LogicalScan(EntityScan::new(entity.clone(), entity.columns().to_vec())),
                vec![],
            )
            .unwrap();
            PlanNode::logical(0, LogicalLimit(Limit::new(limit)), vec![scan]).unwrap()
        };

        assert_eq!(build(10).digest(), build(10).digest());
        assert_eq!(build(10), build(10));
        assert_ne!(build(10).digest(), build(5).digest());
    }

    #[test]
    fn test_replace_at() {
        let entity = test_entity("t1", 100);
        let scan = PlanNode::logical(
            0,
            LogicalScan(EntityScan::new(entity.clone(), entity.columns().to_vec())),
            vec![],
        )
        .unwrap();
        let filter = PlanNode::logical(
            0,
            LogicalFilter(Filter::new(eq_predicate(&entity, "x", 0))),
            vec![scan.clone()],
        )
        .unwrap();
        let root = PlanNode::logical(0, LogicalLimit(Limit::new(5)), vec![filter.clone()]).unwrap();

        let replacement =
            PlanNode::logical(0, LogicalLimit(Limit::new(1)), vec![scan.clone()]).unwrap();
        let new_root = root.replace_at(&[0], replacement.clone()).unwrap();

        assert_eq!(replacement, new_root.node_at(&[0]).unwrap());
        assert_ne!(root.digest(), new_root.digest());
        // Original tree is untouched.
        assert_eq!(filter, root.node_at(&[0]).unwrap());
        assert!(root.node_at(&[0, 0, 0]).is_err());

        let same_root = root.replace_at(&[], new_root.clone()).unwrap();
        assert_eq!(new_root, same_root);
    }

    #[test]
    fn test_base_entity() {
        let entity = test_entity("t1", 100);
        let scan = PlanNode::logical(
            0,
            LogicalScan(EntityScan::new(entity.clone(), entity.columns().to_vec())),
            vec![],
        )
        .unwrap();
        let root = PlanNode::logical(0, LogicalLimit(Limit::new(5)), vec![scan]).unwrap();

        assert_eq!(Some(&entity), root.base_entity());
        assert_eq!(entity.columns(), root.columns());
        assert!(root.physical_properties().is_none());
    }
}
