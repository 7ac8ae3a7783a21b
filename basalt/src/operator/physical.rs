use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use strum_macros::AsRefStr;

use crate::operator::{
    DisplayFields, EntitySample, EntityScan, Fetch, Filter, FullScan, Function, GroupRef,
    IndexScan, Limit, LimitingSort, Projection, Sort, SubSelectFilter, Union,
};

/// Physical relational operator.
#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner, AsRefStr)]
#[enum_dispatch]
pub enum PhysicalOperator {
    /// A scan no access path was chosen for yet. Can't be executed.
    PhysicalUnresolvedScan(EntityScan),
    PhysicalFullScan(FullScan),
    PhysicalSample(EntitySample),
    PhysicalIndexScan(IndexScan),
    PhysicalGroupRef(GroupRef),
    PhysicalFetch(Fetch),
    PhysicalFilter(Filter),
    PhysicalSort(Sort),
    PhysicalLimitingSort(LimitingSort),
    PhysicalLimit(Limit),
    PhysicalProjection(Projection),
    PhysicalFunction(Function),
    PhysicalFilterOnSubSelect(SubSelectFilter),
    PhysicalMerge(Union),
}

impl PhysicalOperator {
    /// Whether this operator can be turned into an executable operator.
    ///
    /// Predicates that can only be answered by an index can't be evaluated by a filter, and
    /// unresolved scans have to be replaced by a concrete access path first.
    pub fn executable(&self) -> bool {
        match self {
            PhysicalOperator::PhysicalUnresolvedScan(_) => false,
            PhysicalOperator::PhysicalFilter(filter) => !filter.predicate().requires_index(),
            PhysicalOperator::PhysicalFilterOnSubSelect(filter) => {
                !filter.predicate().requires_index()
            }
            _ => true,
        }
    }

    /// Whether this operator processes rows independently, so it can be split into partitions.
    pub fn partitionable(&self) -> bool {
        match self {
            PhysicalOperator::PhysicalFullScan(scan) => scan.partition().is_none(),
            PhysicalOperator::PhysicalFilter(_)
            | PhysicalOperator::PhysicalFetch(_)
            | PhysicalOperator::PhysicalProjection(_)
            | PhysicalOperator::PhysicalFunction(_) => true,
            _ => false,
        }
    }
}

impl Display for PhysicalOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())?;
        self.display(f)
    }
}
