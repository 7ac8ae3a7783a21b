use enum_as_inner::EnumAsInner;
use std::fmt::{Display, Formatter};

use crate::operator::{
    DisplayFields, EntitySample, EntityScan, Filter, Function, Limit, Projection, Sort,
    SubSelectFilter, Union,
};
use enum_dispatch::enum_dispatch;
use strum_macros::AsRefStr;

/// Logical relational operator.
#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner, AsRefStr)]
#[enum_dispatch]
pub enum LogicalOperator {
    LogicalScan(EntityScan),
    LogicalSample(EntitySample),
    LogicalFilter(Filter),
    LogicalSort(Sort),
    LogicalLimit(Limit),
    LogicalProjection(Projection),
    LogicalFunction(Function),
    /// Filter whose second input is a sub-query planned as its own group.
    LogicalFilterOnSubSelect(SubSelectFilter),
    LogicalUnion(Union),
}

impl Display for LogicalOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())?;
        self.display(f)
    }
}
